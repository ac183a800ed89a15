//! End-to-end runs of the discovery engine against simulated environments.
//! Every external touchpoint (prober, router client, kernel tables, tracer)
//! is replaced by an in-memory fake, so a full orchestrated run executes
//! without touching the network.

#[cfg(test)]
mod discovery;
#[cfg(test)]
mod fakes;
