//! Expense categories shared by all users.

mod create;
mod db;
mod delete;
mod domain;
mod edit;
mod form;
mod list;

pub use create::{create_category_endpoint, get_new_category_page};
pub use db::{
    count_expenses_per_category, create_category, create_category_table, delete_category,
    get_all_categories, get_category, seed_default_categories, update_category,
};
pub use delete::delete_category_endpoint;
pub use domain::{
    CategoryColor, CategoryFormData, CategoryId, CategoryName, ExpenseCategory, NewCategory,
};
pub use edit::{get_edit_category_page, update_category_endpoint};
pub use list::get_categories_page;
