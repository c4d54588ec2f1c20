use crate::data_source::RawSample;
use crate::geometry::point_wkt;
use crate::observation::Observation;

/// Map one raw producer sample into the unified observation record, deriving
/// the point geometry from (longitude, latitude). Stateless; performs no
/// aggregation.
pub fn normalize(sample: RawSample) -> Observation {
    let geom_wkt = point_wkt(sample.longitude, sample.latitude);
    Observation {
        timestamp: sample.occurred_at,
        dataset: sample.dataset,
        parameter: sample.parameter,
        value: sample.value,
        latitude: sample.latitude,
        longitude: sample.longitude,
        geom_wkt,
        location: sample.site,
        metadata: sample.metadata,
    }
}

/// Normalize a whole batch, preserving order.
pub fn normalize_batch(samples: Vec<RawSample>) -> Vec<Observation> {
    samples.into_iter().map(normalize).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PropertyMap;
    use chrono::Utc;

    fn sample(site: Option<&str>) -> RawSample {
        RawSample {
            occurred_at: Utc::now(),
            dataset: "SENTINEL3_SLSTR".to_string(),
            parameter: "sea_surface_temperature".to_string(),
            value: 18.4,
            latitude: -11.6,
            longitude: -77.3,
            site: site.map(|s| s.to_string()),
            metadata: PropertyMap::new(),
        }
    }

    #[test]
    fn derives_point_geometry_from_lon_lat() {
        let obs = normalize(sample(None));
        assert_eq!(obs.geom_wkt, "POINT(-77.3 -11.6)");
        assert_eq!(obs.latitude, -11.6);
        assert_eq!(obs.longitude, -77.3);
    }

    #[test]
    fn location_present_only_when_source_names_a_site() {
        assert_eq!(normalize(sample(None)).location, None);
        assert_eq!(
            normalize(sample(Some("San Borja"))).location,
            Some("San Borja".to_string())
        );
    }

    #[test]
    fn batch_preserves_order() {
        let mut a = sample(None);
        a.value = 1.0;
        let mut b = sample(None);
        b.value = 2.0;
        let batch = normalize_batch(vec![a, b]);
        assert_eq!(batch[0].value, 1.0);
        assert_eq!(batch[1].value, 2.0);
    }
}
