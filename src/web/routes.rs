//! Route table.

use crate::shipment::ShipmentId;

/// A matched route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// `POST /register`
    Register,
    /// `POST /login`
    Login,
    /// `POST /logout`
    Logout,
    /// `GET /shipments`
    ListOwnShipments,
    /// `POST /shipments`
    CreateShipment,
    /// `GET /shipments/{id}`
    GetShipment(ShipmentId),
    /// `GET /admin/shipments`
    ListAllShipments,
    /// `PUT /shipments/{id}`
    UpdateStatus(ShipmentId),
}

impl Route {
    /// Matches `method` and `path`; an optional `/api` prefix and a trailing
    /// slash are ignored.
    ///
    /// Returns `None` for unknown routes and for ids that are not positive
    /// integers.
    ///
    /// ```
    /// use shipment_core::web::Route;
    /// use shipment_core::ShipmentId;
    ///
    /// assert_eq!(Route::resolve("GET", "/api/shipments/3"), Some(Route::GetShipment(ShipmentId::new(3))));
    /// assert_eq!(Route::resolve("GET", "/shipments/abc"), None);
    /// ```
    pub fn resolve(method: &str, path: &str) -> Option<Self> {
        let path = path.trim_end_matches('/');
        let path = path
            .strip_prefix("/api")
            .filter(|rest| rest.is_empty() || rest.starts_with('/'))
            .unwrap_or(path);
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        let route = match (method, segments.as_slice()) {
            ("POST", ["register"]) => Route::Register,
            ("POST", ["login"]) => Route::Login,
            ("POST", ["logout"]) => Route::Logout,
            ("GET", ["shipments"]) => Route::ListOwnShipments,
            ("POST", ["shipments"]) => Route::CreateShipment,
            ("GET", ["shipments", id]) => Route::GetShipment(parse_id(id)?),
            ("PUT", ["shipments", id]) => Route::UpdateStatus(parse_id(id)?),
            ("GET", ["admin", "shipments"]) => Route::ListAllShipments,
            _ => return None,
        };
        Some(route)
    }

    /// Returns `true` for routes reachable without a bearer token.
    pub fn is_public(self) -> bool {
        matches!(self, Route::Register | Route::Login)
    }
}

fn parse_id(raw: &str) -> Option<ShipmentId> {
    // Digits only: no sign, no whitespace.
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse::<ShipmentId>().ok().filter(|id| id.get() > 0)
}
