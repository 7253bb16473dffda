use std::{env, sync::Arc, sync::Once};

use civic_digest::config::{self, SummaryMethod};
use civic_digest::summarization::ModelHandle;
use civic_digest::{DocumentPipeline, SummaryRequest};

static INIT: Once = Once::new();

fn set_default_env(key: &str, value: &str) {
    let needs_value = env::var(key).map(|v| v.trim().is_empty()).unwrap_or(true);
    if needs_value {
        // SAFETY: Tests run serially via Once and we intentionally mutate process env.
        unsafe {
            env::set_var(key, value);
        }
    }
}

fn init_config_once() -> &'static config::Config {
    INIT.call_once(|| {
        set_default_env("SUMMARIZATION_PROVIDER", "ollama");
        set_default_env("SUMMARIZATION_MODEL", "llama3.2");
        set_default_env("OLLAMA_URL", "http://127.0.0.1:11434");
        config::init_config().expect("config loads");
    });
    config::get_config()
}

#[tokio::test]
#[ignore = "Requires live Ollama"]
async fn live_ollama_model_loads() {
    let config = init_config_once();
    let handle = ModelHandle::load(config).await;
    assert!(
        handle.is_available(),
        "Ollama should serve {}",
        config.summarization_model
    );
}

#[tokio::test]
#[ignore = "Requires live Ollama and network access"]
async fn live_web_page_summary() {
    let config = init_config_once();
    let url = env::var("CIVIC_DIGEST_LIVE_URL")
        .unwrap_or_else(|_| "https://www.example.com/".to_string());
    let model = Arc::new(ModelHandle::load(config).await);
    let pipeline = DocumentPipeline::from_config(config, model).expect("pipeline");

    let result = pipeline
        .extract_and_summarize(&SummaryRequest {
            web_url: Some(url),
            method: Some(SummaryMethod::Abstractive),
            ..SummaryRequest::default()
        })
        .await;

    assert!(!result.full_text.is_empty(), "page should yield text");
    assert!(!result.summary.is_empty());
    assert!(result.summary.len() <= result.full_text.len());
}
