use std::collections::HashMap;
use std::sync::RwLock;

use chrono::Utc;
use tracing::{info, warn};

use crate::db::repositories::settings_repository::SettingsRepository;
use crate::db::DbPool;
use crate::error::AppResult;
use crate::models::settings::{AppSettings, SettingsUpdateInput};
use crate::utils::local_day::{to_iso, ViewerTimezone};
use crate::utils::units::WeightUnit;

const KEY_WEIGHT_UNIT: &str = "weight_unit";
const KEY_TIMEZONE: &str = "timezone";

/// Per-user preferences, cached after the first read.
pub struct SettingsService {
    db: DbPool,
    cache: RwLock<HashMap<String, AppSettings>>,
}

impl SettingsService {
    pub fn new(db: DbPool) -> Self {
        Self {
            db,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn get(&self, user_id: &str) -> AppResult<AppSettings> {
        if let Ok(guard) = self.cache.read() {
            if let Some(settings) = guard.get(user_id) {
                return Ok(settings.clone());
            }
        }

        let settings = self.load_settings_from_db(user_id)?;
        if let Ok(mut guard) = self.cache.write() {
            guard.insert(user_id.to_string(), settings.clone());
        }
        Ok(settings)
    }

    pub fn update(&self, user_id: &str, input: SettingsUpdateInput) -> AppResult<AppSettings> {
        let mut current = self.get(user_id)?;

        // Validate everything before writing anything.
        let timezone = match &input.timezone {
            Some(Some(name)) => {
                let parsed = ViewerTimezone::parse(Some(name))?;
                Some(parsed.name().map(str::to_string))
            }
            Some(None) => Some(None),
            None => None,
        };

        self.db.with_transaction(|conn| {
            if let Some(unit) = input.weight_unit {
                SettingsRepository::upsert(conn, user_id, KEY_WEIGHT_UNIT, unit.as_str())?;
            }
            match &timezone {
                Some(Some(name)) => SettingsRepository::upsert(conn, user_id, KEY_TIMEZONE, name)?,
                Some(None) => SettingsRepository::delete(conn, user_id, KEY_TIMEZONE)?,
                None => {}
            }
            Ok(())
        })?;

        if let Some(unit) = input.weight_unit {
            current.weight_unit = unit;
        }
        if let Some(name) = timezone {
            current.timezone = name;
        }
        current.updated_at = to_iso(&Utc::now());

        if let Ok(mut guard) = self.cache.write() {
            guard.insert(user_id.to_string(), current.clone());
        }
        info!(target: "app::settings", %user_id, "settings updated");
        Ok(current)
    }

    /// Timezone used to bucket sets into local days for `user_id`.
    pub fn timezone(&self, user_id: &str) -> AppResult<ViewerTimezone> {
        let settings = self.get(user_id)?;
        match ViewerTimezone::parse(settings.timezone.as_deref()) {
            Ok(timezone) => Ok(timezone),
            Err(err) => {
                warn!(
                    target: "app::settings",
                    %user_id,
                    error = %err,
                    "stored timezone is invalid, using system time"
                );
                Ok(ViewerTimezone::System)
            }
        }
    }

    pub fn weight_unit(&self, user_id: &str) -> AppResult<WeightUnit> {
        Ok(self.get(user_id)?.weight_unit)
    }

    fn load_settings_from_db(&self, user_id: &str) -> AppResult<AppSettings> {
        let rows = self
            .db
            .with_connection(|conn| SettingsRepository::list(conn, user_id))?;

        let mut settings = AppSettings {
            weight_unit: WeightUnit::default(),
            timezone: None,
            updated_at: to_iso(&Utc::now()),
        };
        let mut latest_updated_at: Option<String> = None;

        for row in rows {
            latest_updated_at = match latest_updated_at {
                Some(current) if current >= row.updated_at => Some(current),
                _ => Some(row.updated_at.clone()),
            };
            match row.key.as_str() {
                KEY_WEIGHT_UNIT => match WeightUnit::try_from(row.value.as_str()) {
                    Ok(unit) => settings.weight_unit = unit,
                    Err(err) => warn!(
                        target: "app::settings",
                        %user_id,
                        error = %err,
                        "ignoring stored weight unit"
                    ),
                },
                KEY_TIMEZONE => settings.timezone = Some(row.value),
                other => warn!(target: "app::settings", key = other, "unknown setting key"),
            }
        }

        if let Some(updated_at) = latest_updated_at {
            settings.updated_at = updated_at;
        }
        Ok(settings)
    }
}
