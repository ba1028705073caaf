pub mod show_output;
