pub mod launch_log;
pub mod path_utils;
