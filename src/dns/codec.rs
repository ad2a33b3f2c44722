//! DNS message encoding and decoding.
//!
//! Queries are built with `hickory-proto` and optionally padded with the
//! EDNS(0) padding option (RFC 7830, RFC 8467 block-length strategy).
//! Replies are checked against the query they answer before any record is
//! looked at.

use crate::base::neterror::NetError;
use crate::dns::resolve::HttpsSvc;
use hickory_proto::op::{Edns, Message, MessageType, OpCode, Query, ResponseCode};
use hickory_proto::rr::rdata::opt::EdnsOption;
use hickory_proto::rr::rdata::svcb::SvcParamValue;
use hickory_proto::rr::{Name, RData, RecordType};
use std::net::IpAddr;

/// Padded queries are a multiple of this many octets.
pub const PADDING_BLOCK_SIZE: usize = 128;

/// Advertised EDNS(0) UDP payload size.
pub const EDNS_MAX_PAYLOAD: u16 = 4096;

const EDNS_PADDING_OPTION: u16 = 12;

// code + length
const EDNS_OPTION_HEADER_LEN: usize = 4;

/// Returns how many padding octets bring a message of `unpadded` octets,
/// plus the option header, to a multiple of [`PADDING_BLOCK_SIZE`].
pub fn padding_length(unpadded: usize) -> usize {
    (PADDING_BLOCK_SIZE - (unpadded + EDNS_OPTION_HEADER_LEN) % PADDING_BLOCK_SIZE)
        % PADDING_BLOCK_SIZE
}

/// A single-question DNS query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DnsQuery {
    domain: String,
    qtype: RecordType,
    id: u16,
}

impl DnsQuery {
    /// Creates a query with a random ID.
    pub fn new(domain: impl Into<String>, qtype: RecordType) -> Self {
        Self {
            domain: domain.into(),
            qtype,
            id: rand::random(),
        }
    }

    /// Replaces the query ID.
    pub fn with_id(mut self, id: u16) -> Self {
        self.id = id;
        self
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn qtype(&self) -> RecordType {
        self.qtype
    }

    pub fn id(&self) -> u16 {
        self.id
    }

    fn message(&self) -> Result<Message, NetError> {
        let mut name =
            Name::from_ascii(&self.domain).map_err(|e| NetError::EncodeFailed(e.to_string()))?;
        name.set_fqdn(true);

        let mut message = Message::new();
        message
            .set_id(self.id)
            .set_message_type(MessageType::Query)
            .set_op_code(OpCode::Query)
            .set_recursion_desired(true)
            .add_query(Query::query(name, self.qtype));
        Ok(message)
    }

    /// Serializes the query. With `padding`, an EDNS(0) record is attached
    /// and padded so that the whole message is a multiple of
    /// [`PADDING_BLOCK_SIZE`] octets.
    pub fn encode(&self, padding: bool) -> Result<Vec<u8>, NetError> {
        let mut message = self.message()?;
        if padding {
            message.set_edns(edns(None));
            let unpadded = to_vec(&message)?.len();
            message.set_edns(edns(Some(vec![0; padding_length(unpadded)])));
        }
        to_vec(&message)
    }
}

/// The OPT record. A `Some` padding option is written even when empty,
/// since its header alone may be what completes the block.
fn edns(padding: Option<Vec<u8>>) -> Edns {
    let mut edns = Edns::new();
    edns.set_max_payload(EDNS_MAX_PAYLOAD);
    edns.set_dnssec_ok(true);
    if let Some(padding) = padding {
        edns.options_mut()
            .insert(EdnsOption::Unknown(EDNS_PADDING_OPTION, padding));
    }
    edns
}

fn to_vec(message: &Message) -> Result<Vec<u8>, NetError> {
    message
        .to_vec()
        .map_err(|e| NetError::EncodeFailed(e.to_string()))
}

#[derive(Clone, Debug)]
enum Reply {
    Wire { message: Message, raw: Vec<u8> },
    Platform { addrs: Vec<IpAddr>, cname: String },
}

/// The reply to a [`DnsQuery`].
///
/// Wire transports produce a decoded DNS message. The platform resolver
/// produces an address list and canonical name directly.
#[derive(Clone, Debug)]
pub struct DnsResponse {
    query: DnsQuery,
    reply: Reply,
}

impl DnsResponse {
    /// Decodes `raw` as the reply to `query`.
    ///
    /// Fails if the message does not parse, is not a response, or carries
    /// a different ID than the query.
    pub fn decode(query: &DnsQuery, raw: Vec<u8>) -> Result<Self, NetError> {
        let message = Message::from_vec(&raw).map_err(|e| NetError::DecodeFailed(e.to_string()))?;
        if message.message_type() != MessageType::Response {
            return Err(NetError::ReplyIsQuery);
        }
        if message.id() != query.id() {
            return Err(NetError::WrongQueryId);
        }
        Ok(Self {
            query: query.clone(),
            reply: Reply::Wire { message, raw },
        })
    }

    /// Wraps the result of a platform lookup.
    pub fn from_platform(query: &DnsQuery, addrs: Vec<IpAddr>, cname: String) -> Self {
        Self {
            query: query.clone(),
            reply: Reply::Platform { addrs, cname },
        }
    }

    pub fn query(&self) -> &DnsQuery {
        &self.query
    }

    /// Raw reply bytes. Empty for platform replies.
    pub fn bytes(&self) -> &[u8] {
        match &self.reply {
            Reply::Wire { raw, .. } => raw,
            Reply::Platform { .. } => &[],
        }
    }

    /// Response code of a wire reply.
    pub fn rcode(&self) -> Option<ResponseCode> {
        match &self.reply {
            Reply::Wire { message, .. } => Some(message.response_code()),
            Reply::Platform { .. } => None,
        }
    }

    /// Canonical name reported by the platform resolver, or the first CNAME
    /// target of a wire reply.
    pub fn canonical_name(&self) -> Option<String> {
        match &self.reply {
            Reply::Platform { cname, .. } if !cname.is_empty() => Some(cname.clone()),
            Reply::Platform { .. } => None,
            Reply::Wire { message, .. } => message.answers().iter().find_map(|r| match r.data() {
                Some(RData::CNAME(cname)) => Some(cname.0.to_utf8()),
                _ => None,
            }),
        }
    }

    fn checked_message(&self) -> Result<&Message, NetError> {
        match &self.reply {
            Reply::Wire { message, .. } => {
                rcode_to_error(message.response_code())?;
                Ok(message)
            }
            Reply::Platform { .. } => Err(NetError::NoDnsTransport),
        }
    }

    /// Addresses answering the query. Only records matching the query type
    /// are considered: A for A queries, AAAA for AAAA queries, both for ANY.
    pub fn lookup_host(&self) -> Result<Vec<IpAddr>, NetError> {
        let addrs: Vec<IpAddr> = match &self.reply {
            Reply::Platform { addrs, .. } => addrs.clone(),
            Reply::Wire { .. } => {
                let qtype = self.query.qtype();
                self.checked_message()?
                    .answers()
                    .iter()
                    .filter_map(|record| match record.data() {
                        Some(RData::A(a)) if matches!(qtype, RecordType::A | RecordType::ANY) => {
                            Some(IpAddr::V4(a.0))
                        }
                        Some(RData::AAAA(aaaa))
                            if matches!(qtype, RecordType::AAAA | RecordType::ANY) =>
                        {
                            Some(IpAddr::V6(aaaa.0))
                        }
                        _ => None,
                    })
                    .collect()
            }
        };
        if addrs.is_empty() {
            return Err(NetError::NoAnswer);
        }
        Ok(addrs)
    }

    /// Merges ALPN values and address hints of every HTTPS record.
    pub fn https(&self) -> Result<HttpsSvc, NetError> {
        let mut svc = HttpsSvc::default();
        let mut found = false;
        for record in self.checked_message()?.answers() {
            let Some(RData::HTTPS(https)) = record.data() else {
                continue;
            };
            found = true;
            for (_, value) in https.svc_params() {
                match value {
                    SvcParamValue::Alpn(alpn) => svc.alpn.extend(alpn.0.iter().cloned()),
                    SvcParamValue::Ipv4Hint(hint) => svc.ipv4.extend(hint.0.iter().map(|a| a.0)),
                    SvcParamValue::Ipv6Hint(hint) => svc.ipv6.extend(hint.0.iter().map(|a| a.0)),
                    _ => {}
                }
            }
        }
        if !found {
            return Err(NetError::NoAnswer);
        }
        Ok(svc)
    }

    /// Name servers listed in the answer section.
    pub fn ns(&self) -> Result<Vec<String>, NetError> {
        let servers: Vec<String> = self
            .checked_message()?
            .answers()
            .iter()
            .filter_map(|record| match record.data() {
                Some(RData::NS(ns)) => Some(ns.0.to_utf8()),
                _ => None,
            })
            .collect();
        if servers.is_empty() {
            return Err(NetError::NoAnswer);
        }
        Ok(servers)
    }
}

/// Maps a reply code to the error it stands for.
pub fn rcode_to_error(rcode: ResponseCode) -> Result<(), NetError> {
    match rcode {
        ResponseCode::NoError => Ok(()),
        ResponseCode::NXDomain => Err(NetError::NoSuchHost),
        ResponseCode::Refused => Err(NetError::Refused),
        ResponseCode::ServFail => Err(NetError::Servfail),
        _ => Err(NetError::ServerMisbehaving),
    }
}
