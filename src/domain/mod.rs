pub mod access;
pub mod board;
pub mod board_service;
pub mod history;
pub mod offline;
pub mod record;
pub mod session;
pub mod timestamp;
pub mod view;
