//! Wizard engine: the step sequence, per-step validation, and the
//! completion fan-out to the storage collectors.
//!
//! Every inbound event loads the chat's draft, validates the answer for the
//! current step, and only then commits the field and advances. Invalid
//! input re-prompts the same step and leaves the draft untouched, so
//! partial garbage never reaches the record assembly.

use std::sync::Arc;

use tracing::{info, warn};

use crate::collector::Collector;
use crate::wizard::normalize::{normalize_amount, normalize_date};
use crate::wizard::record::{BudgetType, Currency, MoneyFlowRecord};
use crate::wizard::session::{Draft, DraftPatch, SessionStore, Step};
use crate::wizard::transport::{ChatTransport, TransportError};

pub struct WizardEngine {
    transport: Arc<dyn ChatTransport>,
    sessions: SessionStore,
    collectors: Vec<Arc<dyn Collector>>,
}

impl WizardEngine {
    pub fn new(transport: Arc<dyn ChatTransport>, collectors: Vec<Arc<dyn Collector>>) -> Self {
        Self {
            transport,
            sessions: SessionStore::new(),
            collectors,
        }
    }

    /// Begin the wizard. Re-entrant: starting mid-wizard discards the
    /// previous partial draft and begins from step 1.
    pub async fn start(&self, chat_id: i64) -> Result<(), TransportError> {
        if self.sessions.is_active(chat_id).await {
            info!("Restarting wizard for chat {chat_id}, dropping partial draft");
        }
        self.sessions.clear(chat_id).await;

        let choices: Vec<String> = BudgetType::ALL.iter().map(|t| t.label().to_string()).collect();
        let message_id = self.transport.prompt(chat_id, "1. Choose type:", &choices).await?;
        self.sessions
            .update(chat_id, DraftPatch { prompt_message_id: Some(message_id), ..Default::default() })
            .await;

        Ok(())
    }

    /// Abort the wizard. A no-op when nothing is in progress.
    pub async fn cancel(&self, chat_id: i64) -> Result<(), TransportError> {
        if !self.sessions.is_active(chat_id).await {
            return Ok(());
        }

        info!("Cancelling wizard for chat {chat_id}");
        self.sessions.clear(chat_id).await;
        self.transport
            .prompt(chat_id, "Entry cancelled. Use /add to start a new record.", &[])
            .await?;

        Ok(())
    }

    /// An inline-keyboard selection arrived.
    pub async fn handle_selection(
        &self,
        chat_id: i64,
        callback_id: &str,
        data: &str,
    ) -> Result<(), TransportError> {
        let Some(draft) = self.sessions.get(chat_id).await else {
            // stale keyboard from a finished or cancelled wizard
            self.transport
                .ack_selection(callback_id, "No entry in progress. Use /add to start.")
                .await
                .ok();
            return Ok(());
        };

        match draft.step {
            Step::BudgetType => self.on_budget_type(chat_id, callback_id, &draft, data).await,
            Step::Category => self.on_category(chat_id, callback_id, &draft, data).await,
            Step::Date => self.on_date(chat_id, Some(callback_id), &draft, data).await,
            Step::Currency => self.on_currency(chat_id, callback_id, &draft, data).await,
            Step::Comment if data.eq_ignore_ascii_case("finish") => {
                self.transport
                    .ack_selection(callback_id, "6/6 - Comment: no comment")
                    .await
                    .ok();
                self.finish_comment(chat_id, &draft, None).await
            }
            Step::Value | Step::Comment => {
                self.transport
                    .ack_selection(callback_id, "Please type the answer as a message.")
                    .await
                    .ok();
                Ok(())
            }
        }
    }

    /// A free-text message arrived.
    pub async fn handle_text(&self, chat_id: i64, text: &str) -> Result<(), TransportError> {
        if text.trim().eq_ignore_ascii_case("cancel") {
            return self.cancel(chat_id).await;
        }

        let Some(draft) = self.sessions.get(chat_id).await else {
            return Ok(());
        };

        match draft.step {
            Step::Date => self.on_date(chat_id, None, &draft, text).await,
            Step::Value => self.on_value(chat_id, &draft, text).await,
            Step::Comment => {
                let comment = if text.trim().eq_ignore_ascii_case("finish") {
                    None
                } else {
                    Some(text.to_string())
                };
                self.finish_comment(chat_id, &draft, comment).await
            }
            Step::BudgetType | Step::Category | Step::Currency => {
                self.transport
                    .prompt(
                        chat_id,
                        "Please pick one of the options on the keyboard above, or type \"cancel\" to exit.",
                        &[],
                    )
                    .await?;
                Ok(())
            }
        }
    }

    async fn on_budget_type(
        &self,
        chat_id: i64,
        callback_id: &str,
        draft: &Draft,
        data: &str,
    ) -> Result<(), TransportError> {
        let Some(budget_type) = BudgetType::from_label(data) else {
            warn!("Unknown budget type selection '{data}' in chat {chat_id}");
            self.transport
                .ack_selection(callback_id, "Unknown option, please pick one from the keyboard.")
                .await
                .ok();
            return Ok(());
        };

        info!("Chat {chat_id}: budget type {}", budget_type.label());
        let progress = format!("1/6 - Type: {}", budget_type.label());
        self.transport.ack_selection(callback_id, &progress).await.ok();
        self.edit_previous_prompt(chat_id, draft, &progress).await;

        self.sessions
            .update(
                chat_id,
                DraftPatch {
                    step: Some(Step::Category),
                    budget_type: Some(data.to_string()),
                    ..Default::default()
                },
            )
            .await;

        let choices: Vec<String> =
            budget_type.categories().iter().map(|c| c.to_string()).collect();
        let message_id = self.transport.prompt(chat_id, "2. Choose category:", &choices).await?;
        self.remember_prompt(chat_id, message_id).await;

        Ok(())
    }

    async fn on_category(
        &self,
        chat_id: i64,
        callback_id: &str,
        draft: &Draft,
        data: &str,
    ) -> Result<(), TransportError> {
        let budget_type = draft
            .budget_type
            .as_deref()
            .and_then(BudgetType::from_label);
        let Some(budget_type) = budget_type else {
            warn!("Category selection without a budget type in chat {chat_id}");
            self.sessions.clear(chat_id).await;
            self.transport
                .ack_selection(callback_id, "Something went wrong, please start over with /add.")
                .await
                .ok();
            return Ok(());
        };

        // The keyboard only offers scoped labels; this guards stale keyboards
        if !budget_type.categories().contains(&data) {
            warn!(
                "Rejected category '{data}' for budget type {} in chat {chat_id}",
                budget_type.label()
            );
            self.transport
                .ack_selection(
                    callback_id,
                    &format!("'{data}' is not a {} category.", budget_type.label()),
                )
                .await
                .ok();
            return Ok(());
        }

        info!("Chat {chat_id}: category {data}");
        let progress = format!("2/6 - Category: {data}");
        self.transport.ack_selection(callback_id, &progress).await.ok();
        self.edit_previous_prompt(chat_id, draft, &progress).await;

        self.sessions
            .update(
                chat_id,
                DraftPatch {
                    step: Some(Step::Date),
                    category: Some(data.to_string()),
                    ..Default::default()
                },
            )
            .await;

        let shortcuts = vec!["today".to_string(), "yesterday".to_string()];
        let message_id = self
            .transport
            .prompt(
                chat_id,
                "3. Enter the date - \"today\", \"yesterday\" or DD.MM:",
                &shortcuts,
            )
            .await?;
        self.remember_prompt(chat_id, message_id).await;

        Ok(())
    }

    async fn on_date(
        &self,
        chat_id: i64,
        callback_id: Option<&str>,
        draft: &Draft,
        text: &str,
    ) -> Result<(), TransportError> {
        let Some(date) = normalize_date(text) else {
            let error = "Wrong date format. Please enter DD.MM (example: 31.05), \"today\" or \"yesterday\", or type \"cancel\" to exit.";
            match callback_id {
                Some(id) => {
                    self.transport.ack_selection(id, error).await.ok();
                }
                None => {
                    self.transport.prompt(chat_id, error, &[]).await?;
                }
            }
            return Ok(());
        };

        info!("Chat {chat_id}: date {date}");
        let progress = format!("3/6 - Date: {}", date.format("%d.%m.%Y"));
        if let Some(id) = callback_id {
            self.transport.ack_selection(id, &progress).await.ok();
        }
        self.edit_previous_prompt(chat_id, draft, &progress).await;

        self.sessions
            .update(
                chat_id,
                DraftPatch { step: Some(Step::Value), date: Some(date), ..Default::default() },
            )
            .await;

        let message_id = self.transport.prompt(chat_id, "4. Enter the amount:", &[]).await?;
        self.remember_prompt(chat_id, message_id).await;

        Ok(())
    }

    async fn on_value(&self, chat_id: i64, draft: &Draft, text: &str) -> Result<(), TransportError> {
        let Some(value) = normalize_amount(text) else {
            self.transport
                .prompt(
                    chat_id,
                    "Please enter a plain number (example: 23.50), or type \"cancel\" to exit.",
                    &[],
                )
                .await?;
            return Ok(());
        };

        info!("Chat {chat_id}: value {value}");
        let progress = format!("4/6 - Sum: {value}");
        self.edit_previous_prompt(chat_id, draft, &progress).await;

        self.sessions
            .update(
                chat_id,
                DraftPatch { step: Some(Step::Currency), value: Some(value), ..Default::default() },
            )
            .await;

        let choices: Vec<String> = Currency::ALL.iter().map(|c| c.label().to_string()).collect();
        let message_id = self.transport.prompt(chat_id, "5. Choose currency:", &choices).await?;
        self.remember_prompt(chat_id, message_id).await;

        Ok(())
    }

    async fn on_currency(
        &self,
        chat_id: i64,
        callback_id: &str,
        draft: &Draft,
        data: &str,
    ) -> Result<(), TransportError> {
        let Some(currency) = Currency::from_label(data) else {
            warn!("Unknown currency selection '{data}' in chat {chat_id}");
            self.transport
                .ack_selection(callback_id, "Unknown currency, please pick one from the keyboard.")
                .await
                .ok();
            return Ok(());
        };

        info!("Chat {chat_id}: currency {}", currency.label());
        let progress = format!("5/6 - Currency: {}", currency.label());
        self.transport.ack_selection(callback_id, &progress).await.ok();
        self.edit_previous_prompt(chat_id, draft, &progress).await;

        self.sessions
            .update(
                chat_id,
                DraftPatch {
                    step: Some(Step::Comment),
                    currency: Some(data.to_string()),
                    ..Default::default()
                },
            )
            .await;

        let finish = vec!["finish".to_string()];
        let message_id = self
            .transport
            .prompt(chat_id, "6. Enter a comment or press \"finish\":", &finish)
            .await?;
        self.remember_prompt(chat_id, message_id).await;

        Ok(())
    }

    /// Record the comment (or its absence) and run completion.
    async fn finish_comment(
        &self,
        chat_id: i64,
        draft: &Draft,
        comment: Option<String>,
    ) -> Result<(), TransportError> {
        let shown = comment.as_deref().unwrap_or("no comment");
        self.edit_previous_prompt(chat_id, draft, &format!("6/6 - Comment: {shown}")).await;

        let mut final_draft = draft.clone();
        final_draft.comment = comment;
        self.complete(chat_id, final_draft).await
    }

    /// Terminal action: assemble the record and fan it out to every
    /// collector concurrently, joining before confirming.
    async fn complete(&self, chat_id: i64, draft: Draft) -> Result<(), TransportError> {
        let record = match MoneyFlowRecord::from_draft(&draft) {
            Ok(record) => record,
            Err(e) => {
                warn!("Record assembly failed for chat {chat_id}: {e}");
                self.sessions.clear(chat_id).await;
                self.transport
                    .prompt(
                        chat_id,
                        &format!(
                            "Could not assemble the record ({e}). Nothing was saved - please start over with /add."
                        ),
                        &[],
                    )
                    .await?;
                return Ok(());
            }
        };

        info!(
            "💾 Saving {} / {} / {} {} on {}",
            record.budget.budget_type().label(),
            record.budget.category_label(),
            record.value,
            record.currency.label(),
            record.date.format("%d.%m.%Y"),
        );

        let mut pending = Vec::new();
        for collector in &self.collectors {
            let collector = collector.clone();
            let name = collector.name().to_string();
            let record = record.clone();
            pending.push((name, tokio::spawn(async move { collector.save(&record).await })));
        }

        let mut failed = Vec::new();
        for (name, handle) in pending {
            match handle.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!("Collector save failed: {e}");
                    failed.push(name);
                }
                Err(e) => {
                    warn!("Collector '{name}' task failed: {e}");
                    failed.push(name);
                }
            }
        }

        self.sessions.clear(chat_id).await;

        if failed.is_empty() {
            self.transport
                .prompt(chat_id, "Budget data successfully saved!", &[])
                .await?;
        } else {
            self.transport
                .prompt(
                    chat_id,
                    &format!(
                        "Saving failed for: {}. The record was not fully saved - please enter it again with /add.",
                        failed.join(", ")
                    ),
                    &[],
                )
                .await?;
        }

        Ok(())
    }

    /// Turn the answered prompt into a progress line and strip its keyboard.
    /// Best-effort: an edit failure is logged by the transport and ignored.
    async fn edit_previous_prompt(&self, chat_id: i64, draft: &Draft, progress: &str) {
        if let Some(message_id) = draft.prompt_message_id {
            self.transport.edit_prompt(chat_id, message_id, progress).await.ok();
        }
    }

    async fn remember_prompt(&self, chat_id: i64, message_id: i64) {
        self.sessions
            .update(chat_id, DraftPatch { prompt_message_id: Some(message_id), ..Default::default() })
            .await;
    }
}
