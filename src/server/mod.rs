mod server;
mod shutdown;

pub(crate) use server::RpcServer;
pub(crate) use shutdown::shutdown_signal;
pub(crate) use shutdown::ServerShutdownHandle;
pub(crate) use shutdown::ServerShutdownSignal;
