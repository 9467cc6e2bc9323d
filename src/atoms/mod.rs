//! # Toronto Standard Operators
//!
//! The operators every program can use unless an embedder supplies its own table.
//!
//! ## Module Structure
//!
//! - **`helpers`**: Shared argument checks for all operators
//! - **`math`**: Arithmetic, logic, bitwise and comparison (`+`, `and`, `band`, `<=`, ...)
//! - **`collections`**: `vector`, `record`, member access and comma sequences
//! - **`special_forms`**: Binding (`def`, `get`, `=`), control (`do`, `?`, `cond`, `call`)
//!   and functions (`func`, `async`, `=>`)
//! - **`staging`**: `preserve`, `escape`, `eval`, `spread` and macro definition
//!
//! Each domain module depends only on `helpers` and registers its own operators.

use once_cell::sync::Lazy;

use crate::runtime::scope::OperatorTable;

pub mod helpers;

pub mod collections;
pub mod math;
pub mod special_forms;
pub mod staging;

static STANDARD_TABLE: Lazy<OperatorTable> = Lazy::new(|| {
    let mut table = OperatorTable::new();
    register_all(&mut table);
    table
});

/// The standard operator table. Built once; every call returns a cheap clone.
pub fn standard_table() -> OperatorTable {
    STANDARD_TABLE.clone()
}

/// Registers all standard operators from all modules with the given table.
pub fn register_all(table: &mut OperatorTable) {
    math::register_math_ops(table);
    collections::register_collection_ops(table);
    special_forms::register_special_forms(table);
    staging::register_staging_ops(table);
}
