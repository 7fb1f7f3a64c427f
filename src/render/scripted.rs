//! A renderer that follows a script instead of fetching anything.
//!
//! Each URL is mapped to an outcome (a marked document with N pages, a
//! failure, or a failure after a truncated write) and an optional delay, which lets tests force any completion
//! order across concurrently rendered URLs.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use super::Renderer;
use crate::config::RenderOptions;
use crate::error::RenderError;
use crate::testing::marked_pdf;

#[derive(Debug, Clone)]
enum Outcome {
    Pages { label: String, pages: u32 },
    Fail { message: String },
    Truncated { message: String },
}

#[derive(Debug, Clone)]
struct Plan {
    outcome: Outcome,
    delay: Duration,
}

/// Scripted [`Renderer`] test double.
#[derive(Debug, Default)]
pub struct ScriptedRenderer {
    plans: HashMap<String, Plan>,
    completed: Mutex<Vec<String>>,
    seen_options: Mutex<Vec<RenderOptions>>,
}

impl ScriptedRenderer {
    /// A renderer with no scripted URLs; every render fails.
    pub fn new() -> Self {
        Self::default()
    }

    /// Render `url` as a document of `pages` pages marked `<label>-<n>`.
    pub fn with_pages(mut self, url: &str, label: &str, pages: u32) -> Self {
        self.plan_mut(url).outcome = Outcome::Pages {
            label: label.to_string(),
            pages,
        };
        self
    }

    /// Fail rendering `url` with `message`.
    pub fn with_failure(mut self, url: &str, message: &str) -> Self {
        self.plan_mut(url).outcome = Outcome::Fail {
            message: message.to_string(),
        };
        self
    }

    /// Fail rendering `url` with `message` after leaving a truncated file at
    /// the destination.
    pub fn with_partial_failure(mut self, url: &str, message: &str) -> Self {
        self.plan_mut(url).outcome = Outcome::Truncated {
            message: message.to_string(),
        };
        self
    }

    /// Settle the render of `url` only after `delay`.
    pub fn with_delay(mut self, url: &str, delay: Duration) -> Self {
        self.plan_mut(url).delay = delay;
        self
    }

    /// URLs in the order their renders settled.
    pub fn completion_order(&self) -> Vec<String> {
        self.completed
            .lock()
            .map(|completed| completed.clone())
            .unwrap_or_default()
    }

    /// Options received by each render call, in settle order.
    pub fn seen_options(&self) -> Vec<RenderOptions> {
        self.seen_options
            .lock()
            .map(|seen| seen.clone())
            .unwrap_or_default()
    }

    fn plan_mut(&mut self, url: &str) -> &mut Plan {
        self.plans.entry(url.to_string()).or_insert_with(|| Plan {
            outcome: Outcome::Fail {
                message: "no script for URL".to_string(),
            },
            delay: Duration::ZERO,
        })
    }

    fn record(&self, url: &str, options: &RenderOptions) {
        if let Ok(mut completed) = self.completed.lock() {
            completed.push(url.to_string());
        }
        if let Ok(mut seen) = self.seen_options.lock() {
            seen.push(options.clone());
        }
    }
}

#[async_trait]
impl Renderer for ScriptedRenderer {
    async fn render(
        &self,
        url: &str,
        destination: &Path,
        options: &RenderOptions,
    ) -> Result<(), RenderError> {
        let plan = self.plans.get(url).cloned().unwrap_or(Plan {
            outcome: Outcome::Fail {
                message: format!("no script for {url}"),
            },
            delay: Duration::ZERO,
        });

        if !plan.delay.is_zero() {
            tokio::time::sleep(plan.delay).await;
        }

        let result = match plan.outcome {
            Outcome::Pages { label, pages } => {
                let mut doc = marked_pdf(&label, pages);
                let mut bytes = Vec::new();
                doc.save_to(&mut bytes)
                    .map_err(|e| RenderError::Io(std::io::Error::other(e)))?;
                tokio::fs::write(destination, bytes)
                    .await
                    .map_err(RenderError::Io)
            }
            Outcome::Fail { message } => Err(RenderError::Cli {
                exit_code: Some(1),
                stderr: message,
            }),
            Outcome::Truncated { message } => {
                tokio::fs::write(destination, b"%PDF-1.7\n%")
                    .await
                    .map_err(RenderError::Io)?;
                Err(RenderError::Cli {
                    exit_code: Some(1),
                    stderr: message,
                })
            }
        };

        self.record(url, options);
        result
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}
