//! Client code for offgrid.
//!
//! This crate provides the network fetch pipeline, request classification,
//! fallback content and the worker engine that ties them to a cache store.

pub mod fallback;
pub mod fetch;
pub mod policy;
pub mod worker;

pub use fetch::{FetchClient, FetchConfig, Fetcher};
pub use policy::{Policy, Strategy};
pub use worker::{
    ActivateReport, ClientWindow, ControlMessage, FetchOutcome, Host, HostEffect, NotificationClick,
    NotificationIntent, PendingWork, PushPayload, RecordingHost, Reply, ResponseSource, SyncOutcome, Worker,
};
