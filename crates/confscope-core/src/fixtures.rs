//! Seed data: system SMTP settings for a fresh installation or a test database

use serde_json::json;
use uuid::Uuid;

use crate::prelude::*;
use crate::service::ConfigService;

pub const CONFIGURATION_COUNT: usize = 10;

const TRANSPORTS: [&str; 3] = ["smtp", "sendmail", "native"];

/// Seed `count` protected system records `system.smtp.settings.user.test_N`.
///
/// Written through `upsert` in the `system` context. Context and workplace ids
/// are generated per call, so loading twice adds a second set.
pub async fn load_configuration_data(
	service: &ConfigService,
	count: usize,
) -> ClResult<Vec<ConfigurationRecord>> {
	let mut records = Vec::with_capacity(count);

	for i in 1..=count {
		let cfg = UpsertConfiguration {
			owner_user_id: None,
			key: format!("system.smtp.settings.user.test_{}", i).into(),
			value: json!({
				"direction": {
					"username": format!("smtp_user_{}", i),
					"password": Uuid::new_v4().simple().to_string(),
				},
				"transport": TRANSPORTS[(i - 1) % TRANSPORTS.len()],
			}),
			context_key: format!("user_{}", i).into(),
			context_id: Uuid::new_v4(),
			workplace_id: Uuid::new_v4(),
			flags: Some(FlagSet::from([Flag::ProtectedSystem])),
		};
		records.push(service.upsert(cfg, &Context::System).await?);
	}

	info!("Loaded {} configuration fixtures", records.len());
	Ok(records)
}

// vim: ts=4
