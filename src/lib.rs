// Singleton loader for an external mapping SDK: one download per process,
// concurrent callers share the in-flight load, partial initialization is
// detected and repaired, consumers are built only from validated handles.
pub mod acquirer;
pub mod activator;
pub mod adapters;
pub mod config;
pub mod coordinator;
pub mod credentials;
pub mod error;
pub mod factory;
pub mod geocode;
pub mod logging;
pub mod ports;
pub mod retry;
pub mod testing;
pub mod types;
pub mod validator;
