//! Budget record model: budget types, their category sets, and the
//! fully-validated money-flow record.
//!
//! Categories are scoped by budget type: each [`BudgetType`] has its own
//! category enum, and the [`Budget`] union carries the category payload per
//! variant, so a record cannot pair an income tag with a spending category.

use std::fmt;

use chrono::NaiveDate;

use crate::wizard::session::Draft;

/// Errors raised when assembling a record from collected input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// A required field was never collected.
    MissingField(&'static str),
    /// The stored budget-type label is not a known budget type.
    UnknownBudgetType(String),
    /// The stored category label does not belong to the budget type's set.
    CategoryNotInSet { budget_type: &'static str, category: String },
    /// The stored currency label is not a known currency.
    UnknownCurrency(String),
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "missing field '{field}'"),
            Self::UnknownBudgetType(label) => write!(f, "unknown budget type '{label}'"),
            Self::CategoryNotInSet { budget_type, category } => {
                write!(f, "category '{category}' is not valid for budget type '{budget_type}'")
            }
            Self::UnknownCurrency(label) => write!(f, "unknown currency '{label}'"),
        }
    }
}

impl std::error::Error for RecordError {}

/// Top-level record kinds. Closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetType {
    Income,
    DailySpent,
    FlatSpent,
    VacationSpent,
}

impl BudgetType {
    pub const ALL: [BudgetType; 4] = [
        BudgetType::Income,
        BudgetType::DailySpent,
        BudgetType::FlatSpent,
        BudgetType::VacationSpent,
    ];

    /// Button label, also used as the spreadsheet worksheet name.
    pub fn label(self) -> &'static str {
        match self {
            BudgetType::Income => "Income",
            BudgetType::DailySpent => "Daily",
            BudgetType::FlatSpent => "Flat",
            BudgetType::VacationSpent => "Vacation",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.label() == label)
    }

    /// Category labels valid for this budget type, in keyboard order.
    pub fn categories(self) -> Vec<&'static str> {
        match self {
            BudgetType::Income => IncomeCategory::ALL.iter().map(|c| c.label()).collect(),
            BudgetType::DailySpent => DailyCategory::ALL.iter().map(|c| c.label()).collect(),
            BudgetType::FlatSpent => FlatCategory::ALL.iter().map(|c| c.label()).collect(),
            BudgetType::VacationSpent => VacationCategory::ALL.iter().map(|c| c.label()).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncomeCategory {
    Salary,
    Cashback,
    Bonus,
    TaxReturn,
    Dividends,
    Other,
}

impl IncomeCategory {
    pub const ALL: [IncomeCategory; 6] = [
        IncomeCategory::Salary,
        IncomeCategory::Cashback,
        IncomeCategory::Bonus,
        IncomeCategory::TaxReturn,
        IncomeCategory::Dividends,
        IncomeCategory::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            IncomeCategory::Salary => "Salary",
            IncomeCategory::Cashback => "Cashback",
            IncomeCategory::Bonus => "Bonus",
            IncomeCategory::TaxReturn => "Tax return",
            IncomeCategory::Dividends => "Dividends",
            IncomeCategory::Other => "Other income",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.label() == label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DailyCategory {
    Food,
    Cafe,
    Alcohol,
    Transport,
    Clothes,
    Presents,
    Health,
    Entertainment,
    Fitness,
    SmallPurchases,
    Chemicals,
    Education,
    Taxes,
    Beauty,
}

impl DailyCategory {
    pub const ALL: [DailyCategory; 14] = [
        DailyCategory::Food,
        DailyCategory::Cafe,
        DailyCategory::Alcohol,
        DailyCategory::Transport,
        DailyCategory::Clothes,
        DailyCategory::Presents,
        DailyCategory::Health,
        DailyCategory::Entertainment,
        DailyCategory::Fitness,
        DailyCategory::SmallPurchases,
        DailyCategory::Chemicals,
        DailyCategory::Education,
        DailyCategory::Taxes,
        DailyCategory::Beauty,
    ];

    pub fn label(self) -> &'static str {
        match self {
            DailyCategory::Food => "Food",
            DailyCategory::Cafe => "Cafe, restaurants",
            DailyCategory::Alcohol => "Alcohol",
            DailyCategory::Transport => "Transport",
            DailyCategory::Clothes => "Clothes",
            DailyCategory::Presents => "Presents",
            DailyCategory::Health => "Health",
            DailyCategory::Entertainment => "Entertainment",
            DailyCategory::Fitness => "Fitness",
            DailyCategory::SmallPurchases => "Small purchases",
            DailyCategory::Chemicals => "Household chemicals",
            DailyCategory::Education => "Education",
            DailyCategory::Taxes => "Taxes",
            DailyCategory::Beauty => "Beauty",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.label() == label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlatCategory {
    Rent,
    Utilities,
    Mortgage,
    Furniture,
    Decor,
    Devices,
    Other,
}

impl FlatCategory {
    pub const ALL: [FlatCategory; 7] = [
        FlatCategory::Rent,
        FlatCategory::Utilities,
        FlatCategory::Mortgage,
        FlatCategory::Furniture,
        FlatCategory::Decor,
        FlatCategory::Devices,
        FlatCategory::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FlatCategory::Rent => "Rent",
            FlatCategory::Utilities => "Utilities, internet",
            FlatCategory::Mortgage => "Mortgage",
            FlatCategory::Furniture => "Furniture",
            FlatCategory::Decor => "Decor",
            FlatCategory::Devices => "Devices, appliances",
            FlatCategory::Other => "Other flat costs",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.label() == label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VacationCategory {
    Tickets,
    Lodging,
    PocketMoney,
    Meals,
}

impl VacationCategory {
    pub const ALL: [VacationCategory; 4] = [
        VacationCategory::Tickets,
        VacationCategory::Lodging,
        VacationCategory::PocketMoney,
        VacationCategory::Meals,
    ];

    pub fn label(self) -> &'static str {
        match self {
            VacationCategory::Tickets => "Tickets",
            VacationCategory::Lodging => "Lodging",
            VacationCategory::PocketMoney => "Pocket money",
            VacationCategory::Meals => "Meals",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.label() == label)
    }
}

/// Tagged budget union: one variant per budget type, each carrying its own
/// category type. The only way to construct a mismatched pair is rejected at
/// [`Budget::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Budget {
    Income(IncomeCategory),
    DailySpent(DailyCategory),
    FlatSpent(FlatCategory),
    VacationSpent(VacationCategory),
}

impl Budget {
    /// Validate a category label against the budget type's own set.
    pub fn new(budget_type: BudgetType, category: &str) -> Result<Self, RecordError> {
        let not_in_set = || RecordError::CategoryNotInSet {
            budget_type: budget_type.label(),
            category: category.to_string(),
        };

        match budget_type {
            BudgetType::Income => IncomeCategory::from_label(category)
                .map(Budget::Income)
                .ok_or_else(not_in_set),
            BudgetType::DailySpent => DailyCategory::from_label(category)
                .map(Budget::DailySpent)
                .ok_or_else(not_in_set),
            BudgetType::FlatSpent => FlatCategory::from_label(category)
                .map(Budget::FlatSpent)
                .ok_or_else(not_in_set),
            BudgetType::VacationSpent => VacationCategory::from_label(category)
                .map(Budget::VacationSpent)
                .ok_or_else(not_in_set),
        }
    }

    pub fn budget_type(&self) -> BudgetType {
        match self {
            Budget::Income(_) => BudgetType::Income,
            Budget::DailySpent(_) => BudgetType::DailySpent,
            Budget::FlatSpent(_) => BudgetType::FlatSpent,
            Budget::VacationSpent(_) => BudgetType::VacationSpent,
        }
    }

    pub fn category_label(&self) -> &'static str {
        match self {
            Budget::Income(c) => c.label(),
            Budget::DailySpent(c) => c.label(),
            Budget::FlatSpent(c) => c.label(),
            Budget::VacationSpent(c) => c.label(),
        }
    }
}

/// Record currency. Closed set, EUR by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Currency {
    #[default]
    Eur,
    Rub,
}

impl Currency {
    pub const ALL: [Currency; 2] = [Currency::Eur, Currency::Rub];

    pub fn label(self) -> &'static str {
        match self {
            Currency::Eur => "EUR",
            Currency::Rub => "RUB",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.label() == label)
    }
}

/// A fully-validated money-flow record, ready for the collectors.
#[derive(Debug, Clone, PartialEq)]
pub struct MoneyFlowRecord {
    pub budget: Budget,
    pub date: NaiveDate,
    /// Signed amount, rounded to one fractional digit by the normalizer.
    pub value: f64,
    pub currency: Currency,
    pub comment: Option<String>,
}

impl MoneyFlowRecord {
    /// Assemble a record from a collected draft.
    ///
    /// Construction is atomic: any missing field, unknown label, or a
    /// category outside its budget type's set fails without producing a
    /// partial record. Pure, no side effects.
    pub fn from_draft(draft: &Draft) -> Result<Self, RecordError> {
        let type_label = draft
            .budget_type
            .as_deref()
            .ok_or(RecordError::MissingField("budget_type"))?;
        let budget_type = BudgetType::from_label(type_label)
            .ok_or_else(|| RecordError::UnknownBudgetType(type_label.to_string()))?;

        let category = draft
            .category
            .as_deref()
            .ok_or(RecordError::MissingField("category"))?;
        let budget = Budget::new(budget_type, category)?;

        let date = draft.date.ok_or(RecordError::MissingField("date"))?;
        let value = draft.value.ok_or(RecordError::MissingField("value"))?;

        let currency = match draft.currency.as_deref() {
            Some(label) => Currency::from_label(label)
                .ok_or_else(|| RecordError::UnknownCurrency(label.to_string()))?,
            None => Currency::default(),
        };

        Ok(Self {
            budget,
            date,
            value,
            currency,
            comment: draft.comment.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_draft() -> Draft {
        Draft {
            budget_type: Some("Daily".to_string()),
            category: Some("Food".to_string()),
            date: NaiveDate::from_ymd_opt(2026, 6, 15),
            value: Some(23.5),
            currency: Some("EUR".to_string()),
            comment: None,
            ..Draft::default()
        }
    }

    #[test]
    fn test_every_budget_type_has_categories() {
        for budget_type in BudgetType::ALL {
            assert!(
                !budget_type.categories().is_empty(),
                "{} has no categories",
                budget_type.label()
            );
        }
    }

    #[test]
    fn test_category_sets_are_disjoint_across_types() {
        let sets: Vec<(&str, Vec<&str>)> = BudgetType::ALL
            .into_iter()
            .map(|t| (t.label(), t.categories()))
            .collect();

        for (i, (name_a, set_a)) in sets.iter().enumerate() {
            for (name_b, set_b) in sets.iter().skip(i + 1) {
                for label in set_a {
                    assert!(
                        !set_b.contains(label),
                        "'{label}' appears in both {name_a} and {name_b}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_budget_type_label_round_trip() {
        for budget_type in BudgetType::ALL {
            assert_eq!(BudgetType::from_label(budget_type.label()), Some(budget_type));
        }
        assert_eq!(BudgetType::from_label("Groceries"), None);
    }

    #[test]
    fn test_budget_rejects_category_from_other_type() {
        // Food belongs to DailySpent, not Income
        let err = Budget::new(BudgetType::Income, "Food").unwrap_err();
        assert!(matches!(err, RecordError::CategoryNotInSet { .. }));
    }

    #[test]
    fn test_budget_accepts_scoped_category() {
        let budget = Budget::new(BudgetType::Income, "Salary").unwrap();
        assert_eq!(budget.budget_type(), BudgetType::Income);
        assert_eq!(budget.category_label(), "Salary");
    }

    #[test]
    fn test_from_draft_valid() {
        let record = MoneyFlowRecord::from_draft(&full_draft()).unwrap();
        assert_eq!(record.budget, Budget::DailySpent(DailyCategory::Food));
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2026, 6, 15).unwrap());
        assert_eq!(record.value, 23.5);
        assert_eq!(record.currency, Currency::Eur);
        assert_eq!(record.comment, None);
    }

    #[test]
    fn test_from_draft_currency_defaults_to_eur() {
        let mut draft = full_draft();
        draft.currency = None;
        let record = MoneyFlowRecord::from_draft(&draft).unwrap();
        assert_eq!(record.currency, Currency::Eur);
    }

    #[test]
    fn test_from_draft_missing_value() {
        let mut draft = full_draft();
        draft.value = None;
        assert_eq!(
            MoneyFlowRecord::from_draft(&draft),
            Err(RecordError::MissingField("value"))
        );
    }

    #[test]
    fn test_from_draft_missing_budget_type() {
        let mut draft = full_draft();
        draft.budget_type = None;
        assert_eq!(
            MoneyFlowRecord::from_draft(&draft),
            Err(RecordError::MissingField("budget_type"))
        );
    }

    #[test]
    fn test_from_draft_unknown_budget_type() {
        let mut draft = full_draft();
        draft.budget_type = Some("Savings".to_string());
        assert!(matches!(
            MoneyFlowRecord::from_draft(&draft),
            Err(RecordError::UnknownBudgetType(_))
        ));
    }

    #[test]
    fn test_from_draft_cross_type_category() {
        let mut draft = full_draft();
        draft.budget_type = Some("Income".to_string());
        // Food is a Daily category
        assert!(matches!(
            MoneyFlowRecord::from_draft(&draft),
            Err(RecordError::CategoryNotInSet { .. })
        ));
    }

    #[test]
    fn test_from_draft_unknown_currency() {
        let mut draft = full_draft();
        draft.currency = Some("USD".to_string());
        assert_eq!(
            MoneyFlowRecord::from_draft(&draft),
            Err(RecordError::UnknownCurrency("USD".to_string()))
        );
    }

    #[test]
    fn test_from_draft_keeps_comment() {
        let mut draft = full_draft();
        draft.comment = Some("lunch with friends".to_string());
        let record = MoneyFlowRecord::from_draft(&draft).unwrap();
        assert_eq!(record.comment.as_deref(), Some("lunch with friends"));
    }
}
