use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};

use pg_core::ClassificationEngine;

use crate::source::CliSource;
use crate::verdict_json;

pub struct StreamOptions {
    pub source: CliSource,
    pub interval: Duration,
}

/// Classify stdin line by line while refreshing the dataset in the background.
pub fn run_stream(engine: ClassificationEngine, opts: StreamOptions) -> Result<(), String> {
    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| format!("Failed to start tokio runtime: {}", e))?;
    runtime.block_on(run_stream_async(Arc::new(engine), opts))
}

async fn run_stream_async(engine: Arc<ClassificationEngine>, opts: StreamOptions) -> Result<(), String> {
    let source = Arc::new(opts.source);

    // First load happens before any URL is read so early lookups see data.
    engine.refresh(source.as_ref()).await;

    let refresher = {
        let engine = Arc::clone(&engine);
        let source = Arc::clone(&source);
        let interval = opts.interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                engine.refresh(source.as_ref()).await;
            }
        })
    };

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let result = loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let url = line.trim();
                if url.is_empty() {
                    continue;
                }
                let classification = engine.classify_url(url);
                println!("{}", verdict_json(url, &classification));
            }
            Ok(None) => break Ok(()),
            Err(e) => break Err(format!("Failed to read stdin: {}", e)),
        }
    };

    refresher.abort();
    result
}
