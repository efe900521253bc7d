use chrono::DateTime;
use chrono::Utc;
use uuid::Uuid;

use crate::identity::models::IdentityId;

/// Budgeting category owned by one identity.
///
/// Only the default-seeding side of categories lives in this service: every
/// new identity gets the starter set below, written in the same transaction
/// as the identity row.
#[derive(Debug, Clone)]
pub struct Category {
    pub id: Uuid,
    pub user_id: IdentityId,
    pub name: String,
    pub icon: String,
    pub color: String,
    pub kind: CategoryKind,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryKind {
    Expense,
    Income,
}

impl CategoryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryKind::Expense => "expense",
            CategoryKind::Income => "income",
        }
    }
}

impl Category {
    fn new(user_id: IdentityId, name: &str, icon: &str, color: &str, kind: CategoryKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            name: name.to_string(),
            icon: icon.to_string(),
            color: color.to_string(),
            kind,
            created_at: Utc::now(),
        }
    }

    /// Starter categories created for every new identity.
    pub fn defaults_for(user_id: IdentityId) -> Vec<Category> {
        use CategoryKind::Expense;
        use CategoryKind::Income;

        vec![
            // Expense categories
            Category::new(user_id, "Food & Dining", "🍽️", "#FF6B6B", Expense),
            Category::new(user_id, "Transportation", "🚗", "#4ECDC4", Expense),
            Category::new(user_id, "Shopping", "🛍️", "#45B7D1", Expense),
            Category::new(user_id, "Entertainment", "🎬", "#96CEB4", Expense),
            Category::new(user_id, "Bills & Utilities", "📱", "#FFEAA7", Expense),
            Category::new(user_id, "Healthcare", "🏥", "#DDA0DD", Expense),
            Category::new(user_id, "Other", "📦", "#B0BEC5", Expense),
            // Income categories
            Category::new(user_id, "Salary", "💰", "#4CAF50", Income),
            Category::new(user_id, "Freelance", "💻", "#8BC34A", Income),
            Category::new(user_id, "Investments", "📈", "#00BCD4", Income),
            Category::new(user_id, "Other Income", "💵", "#9C27B0", Income),
        ]
    }
}
