mod common;
mod photo;
