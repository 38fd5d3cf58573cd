/// User identifiers are opaque strings minted by the user repository.
pub type UserId = String;
