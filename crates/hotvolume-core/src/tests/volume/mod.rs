mod action;
mod operations;
