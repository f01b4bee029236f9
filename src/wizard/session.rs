//! Per-chat store for in-progress wizard drafts.
//!
//! One draft per chat, created on /add and destroyed on completion or
//! cancel. The mutex only guards the map itself: Telegram delivers updates
//! for a single chat in order, so a draft never has two handlers racing on
//! it.

use std::collections::HashMap;

use chrono::NaiveDate;
use tokio::sync::Mutex;

/// The step the wizard is waiting on. Strict linear order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Step {
    #[default]
    BudgetType,
    Category,
    Date,
    Value,
    Currency,
    Comment,
}

/// Raw and partially-typed values collected so far for one chat.
///
/// Keyboard selections are stored as their label text; dates and amounts are
/// stored already normalized. Final validation happens in
/// [`MoneyFlowRecord::from_draft`](crate::wizard::record::MoneyFlowRecord::from_draft).
#[derive(Debug, Clone, Default)]
pub struct Draft {
    pub step: Step,
    pub budget_type: Option<String>,
    pub category: Option<String>,
    pub date: Option<NaiveDate>,
    pub value: Option<f64>,
    pub currency: Option<String>,
    pub comment: Option<String>,
    /// Id of the last prompt message, so it can be edited into a progress
    /// line once the step is answered.
    pub prompt_message_id: Option<i64>,
}

/// A partial draft update. `Some` fields overwrite, `None` fields are
/// retained.
#[derive(Debug, Clone, Default)]
pub struct DraftPatch {
    pub step: Option<Step>,
    pub budget_type: Option<String>,
    pub category: Option<String>,
    pub date: Option<NaiveDate>,
    pub value: Option<f64>,
    pub currency: Option<String>,
    pub comment: Option<String>,
    pub prompt_message_id: Option<i64>,
}

/// In-memory draft store keyed by chat id.
pub struct SessionStore {
    drafts: Mutex<HashMap<i64, Draft>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            drafts: Mutex::new(HashMap::new()),
        }
    }

    /// Get a copy of the chat's draft, if a wizard is active.
    pub async fn get(&self, chat_id: i64) -> Option<Draft> {
        self.drafts.lock().await.get(&chat_id).cloned()
    }

    pub async fn is_active(&self, chat_id: i64) -> bool {
        self.drafts.lock().await.contains_key(&chat_id)
    }

    /// Merge a patch into the chat's draft, creating it if absent.
    pub async fn update(&self, chat_id: i64, patch: DraftPatch) {
        let mut drafts = self.drafts.lock().await;
        let draft = drafts.entry(chat_id).or_default();

        if let Some(step) = patch.step {
            draft.step = step;
        }
        if let Some(budget_type) = patch.budget_type {
            draft.budget_type = Some(budget_type);
        }
        if let Some(category) = patch.category {
            draft.category = Some(category);
        }
        if let Some(date) = patch.date {
            draft.date = Some(date);
        }
        if let Some(value) = patch.value {
            draft.value = Some(value);
        }
        if let Some(currency) = patch.currency {
            draft.currency = Some(currency);
        }
        if let Some(comment) = patch.comment {
            draft.comment = Some(comment);
        }
        if let Some(message_id) = patch.prompt_message_id {
            draft.prompt_message_id = Some(message_id);
        }
    }

    /// Drop the chat's draft. Idempotent.
    pub async fn clear(&self, chat_id: i64) {
        self.drafts.lock().await.remove(&chat_id);
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
