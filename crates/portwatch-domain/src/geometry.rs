use crate::error::DomainResult;

/// External geometry capability: WKT parsing, the intersects predicate and
/// geodesic area over SRID 4326 coordinates.
///
/// The engine is an infrastructure seam; the portwatch-geometry crate provides
/// the production implementation on top of the geo/wkt stack.
#[cfg_attr(test, mockall::automock)]
pub trait GeometryEngine: Send + Sync {
    /// Validate that `wkt` parses as a geometry. Fails with `InvalidGeometry`.
    fn validate(&self, wkt: &str) -> DomainResult<()>;

    /// Whether the two geometries intersect.
    fn intersects(&self, left_wkt: &str, right_wkt: &str) -> DomainResult<bool>;

    /// Geodesic area of the geometry in square meters. Zero for geometries
    /// without area (points, lines).
    fn area_m2(&self, wkt: &str) -> DomainResult<f64>;

    /// GeoJSON geometry object for the given WKT.
    fn to_geojson(&self, wkt: &str) -> DomainResult<serde_json::Value>;
}

/// WKT for a point at (longitude, latitude), the derived geometry of every
/// observation.
pub fn point_wkt(longitude: f64, latitude: f64) -> String {
    format!("POINT({} {})", longitude, latitude)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_wkt_is_lon_lat_ordered() {
        assert_eq!(point_wkt(-77.2725, -11.5675), "POINT(-77.2725 -11.5675)");
    }
}
