//! Work-done progress reporting via the LSP `$/progress` notification.
//!
//! While `crystal tool implementations` runs, the editor shows an activity
//! indicator ("crystal-analyzer: Implementations"). Compiler queries can take
//! seconds on larger projects, so the user needs to see that something is
//! happening.

use std::{
    panic::AssertUnwindSafe,
    sync::atomic::{AtomicU64, Ordering},
};

use futures::FutureExt;
use tower_lsp::{Client, lsp_types::*};
use tracing::{debug, warn};

static NEXT_PROGRESS_ID: AtomicU64 = AtomicU64::new(1);
const PROGRESS_TITLE_PREFIX: &str = "crystal-analyzer:";

/// A handle to an active work-done progress session.
///
/// Created by [`ProgressToken::begin`]; call [`end`](Self::end) when the
/// operation completes. If dropped without `end`, the `Drop` impl sends a
/// fire-and-forget `End` notification so the editor never shows a stuck
/// spinner.
pub struct ProgressToken {
    client: Option<Client>,
    token: Option<NumberOrString>,
}

impl ProgressToken {
    /// Start a new progress session: `window/workDoneProgress/create`
    /// followed by a `$/progress` `Begin` notification.
    ///
    /// The create request runs as a background task. If the editor doesn't
    /// support it, the begin notification alone is tolerated by every client
    /// we've seen.
    pub async fn begin(client: &Client, title: &str, message: Option<String>) -> Self {
        let id = NEXT_PROGRESS_ID.fetch_add(1, Ordering::Relaxed);
        let token = NumberOrString::String(format!("crystalAnalyzer/{title}/{id}"));
        let display_title = format!("{PROGRESS_TITLE_PREFIX} {title}");

        let create_client = client.clone();
        let create_token = token.clone();
        tokio::spawn(async move {
            let result = AssertUnwindSafe(create_client.send_request::<request::WorkDoneProgressCreate>(
                WorkDoneProgressCreateParams {
                    token: create_token,
                },
            ))
            .catch_unwind()
            .await;
            match result {
                Ok(Ok(())) => {}
                Ok(Err(error)) => {
                    debug!("workDoneProgress/create failed (editor may not support it): {error}");
                }
                Err(_) => {
                    warn!("workDoneProgress/create panicked (client may have disconnected)");
                }
            }
        });

        let send_ok = AssertUnwindSafe(client.send_notification::<notification::Progress>(
            ProgressParams {
                token: token.clone(),
                value: ProgressParamsValue::WorkDone(WorkDoneProgress::Begin(
                    WorkDoneProgressBegin {
                        title: display_title,
                        cancellable: Some(false),
                        message,
                        percentage: None,
                    },
                )),
            },
        ))
        .catch_unwind()
        .await;

        if send_ok.is_err() {
            warn!("progress begin notification panicked (client may have disconnected)");
            return Self {
                client: None,
                token: None,
            };
        }

        Self {
            client: Some(client.clone()),
            token: Some(token),
        }
    }

    /// Finish the progress session. Consumes `self` so that no further
    /// updates can be sent.
    pub async fn end(mut self, message: Option<String>) {
        let Some(client) = self.client.take() else {
            return;
        };
        let Some(token) = self.token.take() else {
            return;
        };

        let _ = AssertUnwindSafe(client.send_notification::<notification::Progress>(
            ProgressParams {
                token,
                value: ProgressParamsValue::WorkDone(WorkDoneProgress::End(WorkDoneProgressEnd {
                    message,
                })),
            },
        ))
        .catch_unwind()
        .await;
    }
}

impl Drop for ProgressToken {
    fn drop(&mut self) {
        if let (Some(client), Some(token)) = (self.client.take(), self.token.take()) {
            debug!("progress cancelled (drop): {token:?}");
            tokio::spawn(async move {
                let _ = AssertUnwindSafe(client.send_notification::<notification::Progress>(
                    ProgressParams {
                        token,
                        value: ProgressParamsValue::WorkDone(WorkDoneProgress::End(
                            WorkDoneProgressEnd {
                                message: Some("Cancelled".to_string()),
                            },
                        )),
                    },
                ))
                .catch_unwind()
                .await;
            });
        }
    }
}
