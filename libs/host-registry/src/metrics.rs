#![allow(missing_docs)] // proc macros dont play nicely with docstrings

//! Registry-local metrics, lazily initialized on first access.
use lazy_static::lazy_static;
use prometheus::{
    IntCounter, IntCounterVec, IntGauge, register_int_counter, register_int_counter_vec,
    register_int_gauge,
};
use prometheus_static_metric::make_static_metric;

make_static_metric! {
    pub label_enum RegistryOp {
        add,
        edit,
        remove,
    }
    pub struct RegistryWrites: IntCounter {
        "op" => RegistryOp
    }
}

lazy_static! {
    pub static ref REGISTRY_WRITES_VEC: IntCounterVec = register_int_counter_vec!(
        "registry_writes",
        "count of reservation changes persisted to the config",
        &["op"]
    )
    .unwrap();

    /// persisted changes by operation
    pub static ref REGISTRY_WRITES: RegistryWrites = RegistryWrites::from(&REGISTRY_WRITES_VEC);

    /// failed config rewrites
    pub static ref REGISTRY_WRITE_ERRORS: IntCounter = register_int_counter!(
        "registry_write_errors",
        "count of failed config rewrites"
    )
    .unwrap();

    /// reservations seen on the last successful read
    pub static ref RESERVATIONS: IntGauge =
        register_int_gauge!("reservations", "count of dhcp-host reservations in the config").unwrap();
}
