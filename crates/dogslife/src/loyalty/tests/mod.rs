mod common;
mod progress;
