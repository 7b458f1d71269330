//! Aggregate registrant counts for admin dashboards

use serde::Serialize;
use std::collections::BTreeMap;

use crate::domains::registrants::models::{RegistrantFilter, StatusFilter};
use crate::domains::registrants::{RegistrantStatus, RegistryError};
use crate::kernel::ServerDeps;

#[derive(Debug, Clone, Default, Serialize)]
pub struct RegistrantStats {
    pub total: i64,
    pub by_status: BTreeMap<String, i64>,
    pub missing_status: i64,
    /// Member id prefix → count; prefixes with no members are omitted
    pub by_prefix: BTreeMap<String, i64>,
    /// Sector category → count of registrants in known sectors
    pub by_category: BTreeMap<String, i64>,
}

pub async fn registrant_stats(deps: &ServerDeps) -> Result<RegistrantStats, RegistryError> {
    let store = deps.store.as_ref();
    let mut stats = RegistrantStats {
        total: store.count(&RegistrantFilter::new()).await?,
        missing_status: store
            .count(&RegistrantFilter::new().status(StatusFilter::Missing))
            .await?,
        ..Default::default()
    };

    for status in RegistrantStatus::ALL {
        let filter = RegistrantFilter::new().status(StatusFilter::Is(status));
        stats
            .by_status
            .insert(status.to_string(), store.count(&filter).await?);
    }

    let sectors = deps.engine.sectors();
    for prefix in sectors.all_prefixes() {
        let count = store
            .count(&RegistrantFilter::new().member_id_prefix(prefix))
            .await?;
        if count > 0 {
            stats.by_prefix.insert(prefix.to_string(), count);
        }
    }

    for (category, members) in sectors.sectors_by_category() {
        let mut count = 0;
        for sector in members {
            count += store
                .count(&RegistrantFilter::new().sector(sector.as_str()))
                .await?;
        }
        stats.by_category.insert(category.as_str().to_string(), count);
    }

    Ok(stats)
}
