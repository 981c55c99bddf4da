use shared::protocol::{RESET_DATABASE_PATH, SHUTDOWN_PATH};

/// Server maintenance pages. These are plain navigations for the operator;
/// the client never requests them itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaintenanceLink {
    ResetDatabase,
    Shutdown,
}

impl MaintenanceLink {
    pub const ALL: [MaintenanceLink; 2] = [MaintenanceLink::ResetDatabase, MaintenanceLink::Shutdown];

    pub fn title(self) -> &'static str {
        match self {
            MaintenanceLink::ResetDatabase => "Clear Database",
            MaintenanceLink::Shutdown => "Shutdown Server",
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            MaintenanceLink::ResetDatabase => RESET_DATABASE_PATH,
            MaintenanceLink::Shutdown => SHUTDOWN_PATH,
        }
    }

    pub fn url(self, server_url: &str) -> String {
        format!("{}{}", server_url.trim_end_matches('/'), self.path())
    }
}

/// `Utilities -> Clear Database (url) • Shutdown Server (url)`
pub fn footer(server_url: &str) -> String {
    let links: Vec<String> = MaintenanceLink::ALL
        .iter()
        .map(|link| format!("{} <{}>", link.title(), link.url(server_url)))
        .collect();
    format!("Utilities -> {}", links.join(" • "))
}
