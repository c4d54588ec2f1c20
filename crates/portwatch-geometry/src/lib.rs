//! WKT-backed geometry engine. Geometries are stored and exchanged as WKT in
//! SRID 4326; parsing and the spatial predicates run in-process on geo-types.

use std::str::FromStr;

use geo::{GeodesicArea, Intersects};
use geo_types::Geometry;
use portwatch_domain::{DomainError, DomainResult, GeometryEngine};

/// Production `GeometryEngine` over the `wkt`, `geo` and `geojson` crates.
#[derive(Debug, Default, Clone, Copy)]
pub struct GeoEngine;

impl GeoEngine {
    pub fn new() -> Self {
        Self
    }
}

fn parse_wkt(raw: &str) -> DomainResult<Geometry<f64>> {
    let parsed = wkt::Wkt::<f64>::from_str(raw)
        .map_err(|e| DomainError::InvalidGeometry(format!("WKT parse failed: {e}")))?;
    parsed
        .try_into()
        .map_err(|e| DomainError::InvalidGeometry(format!("unsupported WKT geometry: {e:?}")))
}

impl GeometryEngine for GeoEngine {
    fn validate(&self, wkt: &str) -> DomainResult<()> {
        parse_wkt(wkt).map(|_| ())
    }

    fn intersects(&self, left_wkt: &str, right_wkt: &str) -> DomainResult<bool> {
        let left = parse_wkt(left_wkt)?;
        let right = parse_wkt(right_wkt)?;
        Ok(left.intersects(&right))
    }

    /// Geodesic surface area in square meters. Zero-dimensional geometries
    /// contribute zero.
    fn area_m2(&self, wkt: &str) -> DomainResult<f64> {
        let geom = parse_wkt(wkt)?;
        Ok(geom.geodesic_area_unsigned())
    }

    fn to_geojson(&self, wkt: &str) -> DomainResult<serde_json::Value> {
        let geom = parse_wkt(wkt)?;
        let encoded = geojson::Geometry::from(&geom);
        serde_json::to_value(&encoded)
            .map_err(|e| DomainError::StorageFailure(anyhow::anyhow!(e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Roughly the Chancay terminal breakwater area.
    const PORT_POLYGON: &str =
        "POLYGON((-77.30 -11.60, -77.25 -11.60, -77.25 -11.55, -77.30 -11.55, -77.30 -11.60))";

    #[test]
    fn valid_wkt_passes_validation() {
        let engine = GeoEngine::new();
        assert!(engine.validate(PORT_POLYGON).is_ok());
        assert!(engine.validate("POINT(-77.27 -11.56)").is_ok());
    }

    #[test]
    fn malformed_wkt_is_invalid_geometry() {
        let engine = GeoEngine::new();
        let err = engine.validate("POLYGON((oops))").unwrap_err();
        assert!(matches!(err, DomainError::InvalidGeometry(_)));
    }

    #[test]
    fn point_inside_polygon_intersects() {
        let engine = GeoEngine::new();
        assert!(engine
            .intersects(PORT_POLYGON, "POINT(-77.27 -11.57)")
            .unwrap());
        assert!(!engine
            .intersects(PORT_POLYGON, "POINT(-76.00 -11.57)")
            .unwrap());
    }

    #[test]
    fn polygon_area_is_positive_and_point_area_is_zero() {
        let engine = GeoEngine::new();
        let area = engine.area_m2(PORT_POLYGON).unwrap();
        // ~5.5km x ~5.5km cell near the equator.
        assert!(area > 1.0e7, "area was {area}");
        assert_eq!(engine.area_m2("POINT(-77.27 -11.56)").unwrap(), 0.0);
    }

    #[test]
    fn geojson_rendering_carries_type_and_coordinates() {
        let engine = GeoEngine::new();
        let value = engine.to_geojson("POINT(-77.27 -11.56)").unwrap();
        assert_eq!(value["type"], "Point");
        assert_eq!(value["coordinates"][0], -77.27);
        assert_eq!(value["coordinates"][1], -11.56);
    }
}
