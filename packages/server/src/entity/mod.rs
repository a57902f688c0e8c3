pub mod author;
pub mod category;
pub mod input;
pub mod output;
pub mod plugin;
pub mod plugin_env_variable;
pub mod plugin_tag;
pub mod repository_ssh_key;
pub mod role;
pub mod role_permission;
pub mod runtime;
pub mod tag;
pub mod user;
