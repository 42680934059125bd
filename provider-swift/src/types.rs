//! Keystone v3 request and response types
//!
//! Only the parts of the token response needed to find the object-store
//! endpoint are modeled. Swift listings deserialize straight into
//! `ContainerRef` / `ObjectEntry`.

use serde::{Deserialize, Serialize};

/// `POST /v3/auth/tokens` body: password identity scoped to one project
#[derive(Debug, Serialize)]
pub struct AuthRequest<'a> {
    pub auth: Auth<'a>,
}

#[derive(Debug, Serialize)]
pub struct Auth<'a> {
    pub identity: Identity<'a>,
    pub scope: Scope<'a>,
}

#[derive(Debug, Serialize)]
pub struct Identity<'a> {
    pub methods: [&'a str; 1],
    pub password: PasswordMethod<'a>,
}

#[derive(Debug, Serialize)]
pub struct PasswordMethod<'a> {
    pub user: UserCredentials<'a>,
}

#[derive(Debug, Serialize)]
pub struct UserCredentials<'a> {
    pub id: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct Scope<'a> {
    pub project: ProjectScope<'a>,
}

#[derive(Debug, Serialize)]
pub struct ProjectScope<'a> {
    pub id: &'a str,
}

impl<'a> AuthRequest<'a> {
    pub fn password(user_id: &'a str, password: &'a str, project_id: &'a str) -> Self {
        Self {
            auth: Auth {
                identity: Identity {
                    methods: ["password"],
                    password: PasswordMethod {
                        user: UserCredentials {
                            id: user_id,
                            password,
                        },
                    },
                },
                scope: Scope {
                    project: ProjectScope { id: project_id },
                },
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub token: Token,
}

#[derive(Debug, Deserialize)]
pub struct Token {
    #[serde(default)]
    pub catalog: Vec<CatalogEntry>,
}

#[derive(Debug, Deserialize)]
pub struct CatalogEntry {
    #[serde(rename = "type")]
    pub service_type: String,
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
}

#[derive(Debug, Deserialize)]
pub struct Endpoint {
    #[serde(default)]
    pub region: Option<String>,
    pub interface: String,
    pub url: String,
}

impl Token {
    /// Public object-store URL for the region
    pub fn object_store_url(&self, region: &str) -> Option<&str> {
        self.catalog
            .iter()
            .find(|entry| entry.service_type == "object-store")?
            .endpoints
            .iter()
            .find(|e| e.interface == "public" && e.region.as_deref() == Some(region))
            .map(|e| e.url.as_str())
    }
}
