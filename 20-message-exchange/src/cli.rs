use std::net::{IpAddr, SocketAddr};

use clap::{Args, Parser, Subcommand};

use crate::config::{DEFAULT_PORT, DEFAULT_SERVER_NAME, parse_port};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the server, holding one conversation at a time.
    Server(ServerArgs),
    /// Connect to a server and converse from the terminal.
    Client(ClientArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ServerArgs {
    /// Port to listen on, between 1024 and 49151.
    #[arg(long, default_value_t = DEFAULT_PORT, value_parser = parse_port)]
    pub port: u16,

    /// Address to bind.
    #[arg(long, default_value = "127.0.0.1")]
    pub host: IpAddr,

    /// Sender name stamped on every server message.
    #[arg(long, default_value = DEFAULT_SERVER_NAME)]
    pub name: String,
}

impl ServerArgs {
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

#[derive(Args, Debug, Clone)]
pub struct ClientArgs {
    /// Sender name used for messages typed at the prompt.
    #[arg(long)]
    pub name: String,

    /// Address of the server to connect to.
    #[arg(long, default_value = "127.0.0.1:5000")]
    pub server: SocketAddr,
}
