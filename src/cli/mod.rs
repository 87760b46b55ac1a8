//! CLI command handlers

pub mod commands;

pub use commands::{
    export, import, init, set_cell, sheets, show, user_add, user_delete, user_list, CliContext,
    UserForm,
};
