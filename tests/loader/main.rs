mod coordinator;
mod factory;
mod geocode;
mod retry;
mod support;
