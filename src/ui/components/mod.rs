pub mod confirm_dialog;
pub mod history_list;
pub mod menu;
pub mod saved_list;
pub mod study_view;
