use serde::{Deserialize, Serialize};
use std::fmt;

/// The fixed set of synchronized tables. The schema is declared at compile
/// time and never mutated at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Profiles,
    Campaigns,
    Proxies,
    Settings,
}

impl Table {
    pub const ALL: [Table; 4] = [
        Table::Profiles,
        Table::Campaigns,
        Table::Proxies,
        Table::Settings,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Profiles => "profiles",
            Table::Campaigns => "campaigns",
            Table::Proxies => "proxies",
            Table::Settings => "settings",
        }
    }

    pub fn parse(value: &str) -> Result<Self, String> {
        match value {
            "profiles" => Ok(Table::Profiles),
            "campaigns" => Ok(Table::Campaigns),
            "proxies" => Ok(Table::Proxies),
            "settings" => Ok(Table::Settings),
            other => Err(format!("Unknown table: {other}")),
        }
    }

    pub fn schema(&self) -> &'static TableSchema {
        match self {
            Table::Profiles => &PROFILES_SCHEMA,
            Table::Campaigns => &CAMPAIGNS_SCHEMA,
            Table::Proxies => &PROXIES_SCHEMA,
            Table::Settings => &SETTINGS_SCHEMA,
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Integer,
    Real,
    Boolean,
    Json,
}

#[derive(Debug, Clone, Copy)]
pub struct ColumnDef {
    pub name: &'static str,
    pub kind: ColumnKind,
    pub required: bool,
}

/// Static per-table payload declaration used to validate and (de)serialize
/// record payloads at the storage boundary.
#[derive(Debug, Clone, Copy)]
pub struct TableSchema {
    pub columns: &'static [ColumnDef],
}

impl TableSchema {
    pub fn column(&self, name: &str) -> Option<&'static ColumnDef> {
        self.columns.iter().find(|column| column.name == name)
    }
}

static PROFILES_SCHEMA: TableSchema = TableSchema {
    columns: &[
        ColumnDef {
            name: "name",
            kind: ColumnKind::Text,
            required: true,
        },
        ColumnDef {
            name: "browser",
            kind: ColumnKind::Text,
            required: false,
        },
        ColumnDef {
            name: "user_agent",
            kind: ColumnKind::Text,
            required: false,
        },
        ColumnDef {
            name: "proxy_id",
            kind: ColumnKind::Text,
            required: false,
        },
        ColumnDef {
            name: "fingerprint",
            kind: ColumnKind::Json,
            required: false,
        },
        ColumnDef {
            name: "notes",
            kind: ColumnKind::Text,
            required: false,
        },
    ],
};

static CAMPAIGNS_SCHEMA: TableSchema = TableSchema {
    columns: &[
        ColumnDef {
            name: "name",
            kind: ColumnKind::Text,
            required: true,
        },
        ColumnDef {
            name: "status",
            kind: ColumnKind::Text,
            required: false,
        },
        ColumnDef {
            name: "profile_ids",
            kind: ColumnKind::Json,
            required: false,
        },
        ColumnDef {
            name: "daily_budget",
            kind: ColumnKind::Real,
            required: false,
        },
        ColumnDef {
            name: "enabled",
            kind: ColumnKind::Boolean,
            required: false,
        },
    ],
};

static PROXIES_SCHEMA: TableSchema = TableSchema {
    columns: &[
        ColumnDef {
            name: "host",
            kind: ColumnKind::Text,
            required: true,
        },
        ColumnDef {
            name: "port",
            kind: ColumnKind::Integer,
            required: true,
        },
        ColumnDef {
            name: "protocol",
            kind: ColumnKind::Text,
            required: false,
        },
        ColumnDef {
            name: "username",
            kind: ColumnKind::Text,
            required: false,
        },
        ColumnDef {
            name: "password",
            kind: ColumnKind::Text,
            required: false,
        },
        ColumnDef {
            name: "active",
            kind: ColumnKind::Boolean,
            required: false,
        },
    ],
};

static SETTINGS_SCHEMA: TableSchema = TableSchema {
    columns: &[
        ColumnDef {
            name: "key",
            kind: ColumnKind::Text,
            required: true,
        },
        ColumnDef {
            name: "value",
            kind: ColumnKind::Json,
            required: true,
        },
    ],
};
