mod app;
mod preference_file;
