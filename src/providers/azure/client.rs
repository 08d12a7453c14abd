mod core;
mod iterations;
mod projects;
mod wiql;
mod work_items;

pub use self::core::{AzureDevOpsClient, ClientConfig};
pub use self::wiql::epic_query;
