use std::path::PathBuf;

pub fn default_host() -> String {
    "localhost".to_string()
}

pub fn default_port() -> u16 {
    8081
}

pub fn default_root() -> PathBuf {
    PathBuf::from(".")
}

pub fn default_out_dir() -> PathBuf {
    PathBuf::from("dist")
}

pub fn default_context_lines_above() -> usize {
    2
}

pub fn default_context_lines_below() -> usize {
    3
}
