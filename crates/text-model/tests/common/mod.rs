use text_model::{TextModel, TextModelOptions};

/// Route model logs to the test harness. Filter with `RUST_LOG=text_model=trace`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn model(text: &str) -> TextModel {
    init_tracing();
    TextModel::new(text, TextModelOptions::default())
}
