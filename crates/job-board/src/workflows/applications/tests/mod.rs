mod common;
mod form;
mod registry;
