//! Network protocol messages

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{Order, User, Wine};
use crate::{CoreError, Result, PROTOCOL_VERSION};

/// Commands understood by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Login,
    Guest,
    GetWines,
    Search,
    DisplayCart,
    AddToCart,
    RemoveFromCart,
    NewOrder,
    GetOrdersUser,
}

impl Command {
    pub const ALL: [Command; 9] = [
        Command::Login,
        Command::Guest,
        Command::GetWines,
        Command::Search,
        Command::DisplayCart,
        Command::AddToCart,
        Command::RemoveFromCart,
        Command::NewOrder,
        Command::GetOrdersUser,
    ];

    /// Name on the wire
    pub fn as_str(self) -> &'static str {
        match self {
            Command::Login => "login",
            Command::Guest => "guest",
            Command::GetWines => "get_wines",
            Command::Search => "search",
            Command::DisplayCart => "display_cart",
            Command::AddToCart => "add_to_cart",
            Command::RemoveFromCart => "remove_from_cart",
            Command::NewOrder => "new_order",
            Command::GetOrdersUser => "get_orders_user",
        }
    }

    /// Number of string arguments the command takes
    pub fn arity(self) -> usize {
        match self {
            Command::Guest | Command::GetWines => 0,
            Command::DisplayCart | Command::NewOrder | Command::GetOrdersUser => 1,
            Command::Login | Command::Search | Command::RemoveFromCart => 2,
            Command::AddToCart => 3,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Command {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Command::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| CoreError::UnknownCommand(s.to_string()))
    }
}

/// Request envelope: command name followed by its arguments
///
/// The command travels as a string so that a server can answer an unknown
/// command with an error instead of failing to decode the frame.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Envelope {
    /// MUST match PROTOCOL_VERSION
    pub version: u32,
    pub command: String,
    pub args: Vec<String>,
}

impl Envelope {
    /// Create envelope for the current protocol version
    pub fn new(command: Command, args: Vec<String>) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            command: command.as_str().to_string(),
            args,
        }
    }

    pub fn login(mail: &str, pass: &str) -> Self {
        Self::new(Command::Login, vec![mail.to_string(), pass.to_string()])
    }

    pub fn guest() -> Self {
        Self::new(Command::Guest, vec![])
    }

    pub fn get_wines() -> Self {
        Self::new(Command::GetWines, vec![])
    }

    pub fn search(name: &str, year: &str) -> Self {
        Self::new(Command::Search, vec![name.to_string(), year.to_string()])
    }

    pub fn display_cart(email: &str) -> Self {
        Self::new(Command::DisplayCart, vec![email.to_string()])
    }

    pub fn add_to_cart(email: &str, wine_id: u32, quantity: u32) -> Self {
        Self::new(
            Command::AddToCart,
            vec![email.to_string(), wine_id.to_string(), quantity.to_string()],
        )
    }

    pub fn remove_from_cart(email: &str, wine_id: u32) -> Self {
        Self::new(Command::RemoveFromCart, vec![email.to_string(), wine_id.to_string()])
    }

    pub fn new_order(email: &str) -> Self {
        Self::new(Command::NewOrder, vec![email.to_string()])
    }

    pub fn get_orders_user(email: &str) -> Self {
        Self::new(Command::GetOrdersUser, vec![email.to_string()])
    }

    /// Validate version and argument count, returning the parsed command
    pub fn validate(&self) -> Result<Command> {
        if self.version != PROTOCOL_VERSION {
            return Err(CoreError::ProtocolVersionMismatch {
                expected: PROTOCOL_VERSION,
                got: self.version,
            });
        }

        let command: Command = self.command.parse()?;
        if self.args.len() != command.arity() {
            return Err(CoreError::InvalidArguments {
                command: self.command.clone(),
                reason: format!("expected {} arguments, got {}", command.arity(), self.args.len()),
            });
        }
        Ok(command)
    }

    /// Argument `index` parsed as a number
    pub fn numeric_arg<T: FromStr>(&self, index: usize) -> Result<T> {
        let raw = self.args.get(index).ok_or_else(|| CoreError::InvalidArguments {
            command: self.command.clone(),
            reason: format!("missing argument {}", index),
        })?;
        raw.trim().parse().map_err(|_| CoreError::InvalidArguments {
            command: self.command.clone(),
            reason: format!("argument {} is not a number: {:?}", index, raw),
        })
    }
}

/// Server reply; which variant is expected depends on the command
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum Response {
    Flag(bool),
    Actor(User),
    Wines(Vec<Wine>),
    Order(Order),
    Orders(Vec<Order>),
    /// Actor lacks the permission for this command
    Denied,
    /// Server could not process the request
    Failed(String),
}

impl Response {
    /// Variant name, for logging and errors
    pub fn kind(&self) -> &'static str {
        match self {
            Response::Flag(_) => "flag",
            Response::Actor(_) => "actor",
            Response::Wines(_) => "wines",
            Response::Order(_) => "order",
            Response::Orders(_) => "orders",
            Response::Denied => "denied",
            Response::Failed(_) => "failed",
        }
    }

    fn mismatch(self, expected: &'static str) -> CoreError {
        match self {
            Response::Failed(reason) => CoreError::Remote(reason),
            other => CoreError::UnexpectedResponse {
                expected,
                got: other.kind(),
            },
        }
    }

    pub fn into_flag(self) -> Result<bool> {
        match self {
            Response::Flag(flag) => Ok(flag),
            other => Err(other.mismatch("flag")),
        }
    }

    pub fn into_actor(self) -> Result<User> {
        match self {
            Response::Actor(user) => Ok(user),
            other => Err(other.mismatch("actor")),
        }
    }

    pub fn into_wines(self) -> Result<Vec<Wine>> {
        match self {
            Response::Wines(wines) => Ok(wines),
            other => Err(other.mismatch("wines")),
        }
    }

    pub fn into_order(self) -> Result<Order> {
        match self {
            Response::Order(order) => Ok(order),
            other => Err(other.mismatch("order")),
        }
    }

    pub fn into_orders(self) -> Result<Vec<Order>> {
        match self {
            Response::Orders(orders) => Ok(orders),
            other => Err(other.mismatch("orders")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Permission;

    #[test]
    fn test_command_names_parse_back() {
        for command in Command::ALL {
            assert_eq!(command.as_str().parse::<Command>().unwrap(), command);
        }
    }

    #[test]
    fn test_unknown_command() {
        let result = "drop_tables".parse::<Command>();
        assert!(matches!(result, Err(CoreError::UnknownCommand(name)) if name == "drop_tables"));
    }

    #[test]
    fn test_envelope_builders_match_arity() {
        let envelopes = [
            Envelope::login("a@b.c", "pwd"),
            Envelope::guest(),
            Envelope::get_wines(),
            Envelope::search("barolo", ""),
            Envelope::display_cart("a@b.c"),
            Envelope::add_to_cart("a@b.c", 20, 1),
            Envelope::remove_from_cart("a@b.c", 20),
            Envelope::new_order("a@b.c"),
            Envelope::get_orders_user("a@b.c"),
        ];
        for envelope in envelopes {
            assert!(envelope.validate().is_ok(), "{:?}", envelope);
        }
    }

    #[test]
    fn test_add_to_cart_argument_order() {
        let envelope = Envelope::add_to_cart("user@user.com", 20, 3);
        assert_eq!(envelope.command, "add_to_cart");
        assert_eq!(envelope.args, vec!["user@user.com", "20", "3"]);
    }

    #[test]
    fn test_validation_invalid_version() {
        let mut envelope = Envelope::guest();
        envelope.version = 999;
        match envelope.validate().unwrap_err() {
            CoreError::ProtocolVersionMismatch { expected, got } => {
                assert_eq!(expected, 1);
                assert_eq!(got, 999);
            }
            other => panic!("Expected ProtocolVersionMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_validation_wrong_arity() {
        let envelope = Envelope {
            version: PROTOCOL_VERSION,
            command: "login".to_string(),
            args: vec!["only-mail".to_string()],
        };
        assert!(matches!(envelope.validate(), Err(CoreError::InvalidArguments { .. })));
    }

    #[test]
    fn test_numeric_arg() {
        let envelope = Envelope::add_to_cart("a@b.c", 22, 4);
        assert_eq!(envelope.numeric_arg::<u32>(1).unwrap(), 22);
        assert_eq!(envelope.numeric_arg::<u32>(2).unwrap(), 4);
        assert!(envelope.numeric_arg::<u32>(0).is_err());
        assert!(envelope.numeric_arg::<u32>(7).is_err());
    }

    #[test]
    fn test_response_conversions() {
        assert!(Response::Flag(true).into_flag().unwrap());
        let user = User::new("A", "B", "a@b.c", "", Permission::Customer);
        assert_eq!(Response::Actor(user.clone()).into_actor().unwrap(), user);

        match Response::Flag(false).into_actor() {
            Err(CoreError::UnexpectedResponse { expected, got }) => {
                assert_eq!(expected, "actor");
                assert_eq!(got, "flag");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_failed_becomes_remote_error() {
        let err = Response::Failed("cart is empty".into()).into_order().unwrap_err();
        assert!(matches!(err, CoreError::Remote(msg) if msg == "cart is empty"));
    }

    #[test]
    fn test_response_serialization() {
        let response = Response::Wines(vec![Wine::new(20, "Barolo", "Conterno", 2015, "", 6, "Nebbiolo")]);
        let bytes = postcard::to_allocvec(&response).unwrap();
        let decoded: Response = postcard::from_bytes(&bytes).unwrap();
        assert_eq!(response, decoded);
    }
}
