use sea_query::Iden;

/// Metadata table - key-value store holding the archive's whole documents
#[derive(Iden)]
pub enum Metadata {
    Table,
    Key,
    Value,
}
