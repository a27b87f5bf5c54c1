//! Wire representations of the lead server payloads
//!
//! The server speaks Portuguese field names, serializes ids as either
//! strings or numbers, and emits naive timestamps. Everything is normalized
//! into domain records here so the rest of the crate never sees the wire
//! shape.

use chrono::{DateTime, NaiveDateTime, Utc};
use leadflow_domain::{
    BatchSummary, DispatchOutcome, EnrolledByFilter, FilterMode, HistoryEntry, HistoryPage, Lead,
    LeadPage, LeadStatus, PaymentStatusFilter, ProcessOutcome, Product, UploadReceipt,
};
use serde::{Deserialize, Deserializer};

use super::errors::ApiError;

#[derive(Deserialize)]
#[serde(untagged)]
enum IdRepr {
    Text(String),
    Int(i64),
    Float(f64),
}

impl From<IdRepr> for String {
    fn from(value: IdRepr) -> Self {
        match value {
            IdRepr::Text(text) => text,
            IdRepr::Int(n) => n.to_string(),
            IdRepr::Float(n) => n.to_string(),
        }
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    IdRepr::deserialize(deserializer).map(String::from)
}

fn optional_string_or_number<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(Option::<IdRepr>::deserialize(deserializer)?.map(String::from))
}

/// Accepts RFC 3339 and the naive ISO form the server produces; anything
/// else is treated as absent.
fn lenient_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_timestamp))
}

pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}

/// Server-side spelling of a lead status.
pub(crate) fn lead_status_to_wire(status: LeadStatus) -> &'static str {
    match status {
        LeadStatus::Pending => "pendente",
        LeadStatus::Processed => "processado",
        LeadStatus::Sent => "enviado",
        LeadStatus::Error => "erro",
        LeadStatus::Duplicate => "duplicado",
        LeadStatus::Filtered => "filtrado",
    }
}

pub(crate) fn lead_status_from_wire(raw: &str) -> Option<LeadStatus> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "pendente" => Some(LeadStatus::Pending),
        "processado" => Some(LeadStatus::Processed),
        "enviado" => Some(LeadStatus::Sent),
        "erro" => Some(LeadStatus::Error),
        "duplicado" => Some(LeadStatus::Duplicate),
        "filtrado" => Some(LeadStatus::Filtered),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct UploadResponse {
    #[serde(deserialize_with = "string_or_number")]
    lote_id: String,
    #[serde(default)]
    arquivo: Option<String>,
    #[serde(default)]
    total_registros: u64,
}

impl UploadResponse {
    /// The server echoes the stored file name; fall back to the local one.
    pub(crate) fn into_receipt(self, local_name: &str) -> UploadReceipt {
        UploadReceipt {
            batch_id: self.lote_id,
            file_name: self.arquivo.unwrap_or_else(|| local_name.to_string()),
            total_records: self.total_registros,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProcessResponse {
    total_processados: u64,
    validos: u64,
    duplicados: u64,
    filtrados: u64,
    #[serde(default)]
    detalhes: serde_json::Value,
}

impl From<ProcessResponse> for ProcessOutcome {
    fn from(wire: ProcessResponse) -> Self {
        Self {
            total_processed: wire.total_processados,
            valid_count: wire.validos,
            duplicate_count: wire.duplicados,
            filtered_count: wire.filtrados,
            filter_details: wire.detalhes,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SendResponse {
    #[serde(default, deserialize_with = "optional_string_or_number")]
    disparo_id: Option<String>,
    #[serde(default)]
    total: u64,
    #[serde(default)]
    enviados_sucesso: u64,
    #[serde(default)]
    enviados_erro: u64,
    #[serde(default)]
    consultores_utilizados: Vec<String>,
}

impl From<SendResponse> for DispatchOutcome {
    fn from(wire: SendResponse) -> Self {
        Self {
            dispatch_id: wire.disparo_id,
            total: wire.total,
            sent_success_count: wire.enviados_sucesso,
            sent_error_count: wire.enviados_erro,
            consultants_used: wire.consultores_utilizados,
        }
    }
}

/// Per-status lead counts of one batch. `processados` are valid leads still
/// waiting for dispatch.
#[derive(Debug, Deserialize)]
pub(crate) struct SummaryResponse {
    #[serde(deserialize_with = "string_or_number")]
    lote_id: String,
    #[serde(default)]
    produto_nome: String,
    #[serde(default)]
    total: u64,
    #[serde(default)]
    pendentes: u64,
    #[serde(default)]
    processados: u64,
    #[serde(default)]
    enviados: u64,
    #[serde(default)]
    duplicados: u64,
    #[serde(default)]
    filtrados: u64,
    #[serde(default)]
    erros: u64,
}

impl From<SummaryResponse> for BatchSummary {
    fn from(wire: SummaryResponse) -> Self {
        Self {
            batch_id: wire.lote_id,
            product_name: wire.produto_nome,
            total_records: wire.total,
            valid_count: wire.processados.saturating_add(wire.enviados).saturating_add(wire.erros),
            duplicate_count: wire.duplicados,
            filtered_count: wire.filtrados,
            pending: wire.pendentes,
            awaiting_dispatch: wire.processados,
            sent: wire.enviados,
            errors: wire.erros,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct LeadDocument {
    #[serde(rename = "_id", alias = "id", deserialize_with = "string_or_number")]
    id: String,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    candidato_id: Option<String>,
    #[serde(default)]
    nome: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    celular: Option<String>,
    status: String,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    cpf: Option<String>,
    #[serde(default)]
    curso_nome: Option<String>,
    #[serde(default)]
    polo: Option<String>,
    #[serde(default)]
    inscrito_por: Option<String>,
    #[serde(default)]
    status_mensalidade: Option<String>,
    #[serde(default)]
    motivo_filtro: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    bitrix_lead_id: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    consultor_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    enviado_em: Option<DateTime<Utc>>,
    #[serde(default)]
    erro_envio: Option<String>,
}

impl TryFrom<LeadDocument> for Lead {
    type Error = ApiError;

    fn try_from(doc: LeadDocument) -> Result<Self, Self::Error> {
        let status = lead_status_from_wire(&doc.status).ok_or_else(|| {
            ApiError::Decode(format!("lead {} has unknown status '{}'", doc.id, doc.status))
        })?;

        Ok(Self {
            candidate_id: doc.candidato_id.unwrap_or_default(),
            name: doc.nome.unwrap_or_default(),
            phone: doc.celular.unwrap_or_default(),
            status,
            cpf: doc.cpf,
            course: doc.curso_nome,
            campus: doc.polo,
            enrolled_by: doc.inscrito_por,
            payment_status: doc.status_mensalidade,
            filter_reason: doc.motivo_filtro,
            crm_lead_id: doc.bitrix_lead_id,
            consultant_id: doc.consultor_id,
            sent_at: doc.enviado_em,
            send_error: doc.erro_envio,
            id: doc.id,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct LeadsResponse {
    #[serde(default)]
    leads: Vec<LeadDocument>,
    #[serde(default)]
    total: u64,
}

impl TryFrom<LeadsResponse> for LeadPage {
    type Error = ApiError;

    fn try_from(wire: LeadsResponse) -> Result<Self, Self::Error> {
        let leads = wire.leads.into_iter().map(Lead::try_from).collect::<Result<Vec<_>, _>>()?;
        Ok(Self { leads, total: wire.total })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct HistoryDocument {
    #[serde(deserialize_with = "string_or_number")]
    candidato_id: String,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    produto_id: Option<String>,
    #[serde(default, deserialize_with = "optional_string_or_number")]
    lote_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    enviado_em: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct HistoryResponse {
    #[serde(default)]
    historico: Vec<HistoryDocument>,
    #[serde(default)]
    total: u64,
}

impl From<HistoryResponse> for HistoryPage {
    fn from(wire: HistoryResponse) -> Self {
        Self {
            entries: wire
                .historico
                .into_iter()
                .map(|doc| HistoryEntry {
                    candidate_id: doc.candidato_id,
                    product_id: doc.produto_id,
                    batch_id: doc.lote_id,
                    sent_at: doc.enviado_em,
                })
                .collect(),
            total: wire.total,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct EnrolledByWire {
    #[serde(default)]
    valores_permitidos: Vec<String>,
    #[serde(default)]
    modo: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PaymentStatusWire {
    #[serde(default)]
    remover: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProductDocument {
    #[serde(alias = "_id", deserialize_with = "string_or_number")]
    id: String,
    nome: String,
    #[serde(default)]
    tipo: Option<String>,
    #[serde(default = "default_active")]
    ativo: bool,
    #[serde(default)]
    filtro_inscrito_por: Option<EnrolledByWire>,
    #[serde(default)]
    filtro_status: Option<PaymentStatusWire>,
    #[serde(default)]
    consultores_ids: Vec<String>,
}

fn default_active() -> bool {
    true
}

impl From<ProductDocument> for Product {
    fn from(doc: ProductDocument) -> Self {
        let enrolled = doc.filtro_inscrito_por.unwrap_or_default();
        // Anything other than an explicit blacklist behaves as a whitelist server-side.
        let mode = match enrolled.modo.as_deref().map(str::parse::<FilterMode>) {
            Some(Ok(mode)) => mode,
            _ => FilterMode::Whitelist,
        };

        Self {
            id: doc.id,
            name: doc.nome,
            kind: doc.tipo,
            active: doc.ativo,
            enrolled_by_filter: EnrolledByFilter { values: enrolled.valores_permitidos, mode },
            payment_status_filter: PaymentStatusFilter {
                remove: doc.filtro_status.unwrap_or_default().remover,
            },
            consultant_ids: doc.consultores_ids,
        }
    }
}
