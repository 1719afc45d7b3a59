//! Expenses recorded against pets, with optional receipt images.

mod create;
mod db;
mod delete;
mod domain;
mod edit;
mod form;
mod list;
mod receipt;
mod view;

pub use create::{create_expense_endpoint, get_new_expense_page};
pub use db::{
    ExpenseFilter, ExpenseListItem, count_expenses, count_filtered_expenses,
    count_other_users_expenses_in_category, create_expense, create_expense_table, delete_expense,
    get_expense, get_expense_page, get_filtered_expenses, get_receipts_for_category,
    get_receipts_for_pet, update_expense,
};
pub use delete::delete_expense_endpoint;
pub use domain::{Expense, ExpenseFormData, ExpenseId, MAX_DESCRIPTION_LENGTH, NewExpense};
pub use edit::{get_edit_expense_page, update_expense_endpoint};
pub use list::get_expenses_page;
pub use receipt::{
    MAX_RECEIPT_SIZE, ReceiptUpload, get_receipt, remove_unused_receipts, store_receipt,
};
pub(crate) use view::{PetColumn, expense_table};
