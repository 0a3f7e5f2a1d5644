//! # AlertRule Controller
//!
//! A Kubernetes controller that turns vendor-neutral `AlertRule` resources
//! (`monitoring.kneutral.io/v1alpha1`) into Prometheus-operator
//! `PrometheusRule` resources and keeps them in sync.
//!
//! ## Overview
//!
//! For every AlertRule `<ns>/<name>` the controller:
//!
//! 1. **Adds a finalizer** so deletion waits for cleanup
//! 2. **Generates a PrometheusRule** `<ns>/kneutral-<name>`, owned by the AlertRule
//! 3. **Reports status** (`state`, `prometheusRuleName`, `Ready` condition)
//! 4. **Cleans up** the PrometheusRule when the AlertRule is deleted
//!
//! ## Features
//!
//! - **Idempotent reconciliation** against an abstract [`store::ResourceStore`]
//! - **Cluster mode** using the Kubernetes API and a `kube_runtime` controller
//! - **Standalone mode** using an in-memory store and a periodic resync
//! - **HTTP API** for AlertRule CRUD, health probes and Prometheus metrics

pub mod api;
pub mod config;
pub mod constants;
pub mod controller;
pub mod crd;
pub mod fixtures;
pub mod observability;
pub mod runtime;
pub mod store;
