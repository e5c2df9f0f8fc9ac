//! Wire DTOs

pub mod request;
pub mod response;

pub use request::QueryParams;
pub use response::{
    ComponentHealth, HealthResponse, LayersResponse, PackageDetail, PackageListResponse,
    PackageSummary, SyncResponse,
};
