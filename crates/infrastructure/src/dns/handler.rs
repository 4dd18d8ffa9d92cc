use crate::dns::dnssec::unix_now;
use crate::dns::edns::{
    client_subnet, cookie_option, cookie_reply, echo_subnet, steering_source, CookieStatus,
    CookieVerifier,
};
use crate::dns::events::{QueryEvent, QueryEventEmitter};
use crate::dns::resolution::{RequestContext, ResolutionEngine};
use hickory_proto::op::{Edns, Message, MessageType, OpCode, ResponseCode};
use redzone_application::ports::GeoIpLookup;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error};

/// Payload limit for UDP clients without EDNS (RFC 1035 §4.2.1).
const CLASSIC_UDP_PAYLOAD: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Udp,
    Tcp,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Udp => "udp",
            Self::Tcp => "tcp",
        }
    }
}

/// Turns one wire request into one wire response.
pub struct DnsHandler {
    engine: Arc<ResolutionEngine>,
    cookies: Option<CookieVerifier>,
    geoip: Arc<dyn GeoIpLookup>,
    emitter: QueryEventEmitter,
    max_udp_payload: u16,
}

impl DnsHandler {
    pub fn new(
        engine: Arc<ResolutionEngine>,
        geoip: Arc<dyn GeoIpLookup>,
        emitter: QueryEventEmitter,
        max_udp_payload: u16,
    ) -> Self {
        Self {
            engine,
            cookies: None,
            geoip,
            emitter,
            max_udp_payload: max_udp_payload.max(CLASSIC_UDP_PAYLOAD as u16),
        }
    }

    pub fn with_cookies(mut self, verifier: CookieVerifier) -> Self {
        self.cookies = Some(verifier);
        self
    }

    /// `None` when the request gets no answer at all: unreadable bytes or
    /// a message that is not a query.
    pub async fn handle(
        &self,
        bytes: &[u8],
        peer: SocketAddr,
        protocol: Protocol,
    ) -> Option<Vec<u8>> {
        let started = Instant::now();

        let request = match Message::from_vec(bytes) {
            Ok(request) => request,
            Err(e) => {
                debug!(peer = %peer, error = %e, "Unparsable request");
                let id = u16::from_be_bytes([*bytes.first()?, *bytes.get(1)?]);
                return serialize(&Message::error_msg(id, OpCode::Query, ResponseCode::FormErr));
            }
        };

        if request.message_type() != MessageType::Query {
            return None;
        }
        if request.op_code() != OpCode::Query {
            return serialize(&Message::error_msg(
                request.id(),
                request.op_code(),
                ResponseCode::NotImp,
            ));
        }
        if request.queries().len() != 1 {
            return serialize(&Message::error_msg(
                request.id(),
                request.op_code(),
                ResponseCode::FormErr,
            ));
        }
        let query = request.queries()[0].clone();

        let mut response = Message::new();
        response
            .set_id(request.id())
            .set_message_type(MessageType::Response)
            .set_op_code(OpCode::Query)
            .set_recursion_desired(request.recursion_desired())
            .add_query(query.clone());

        let request_edns = request.extensions().as_ref();
        let dnssec_ok = request_edns.is_some_and(|e| e.dnssec_ok());
        let mut response_edns = request_edns.map(|_| {
            let mut edns = Edns::new();
            edns.set_max_payload(self.max_udp_payload);
            edns.set_dnssec_ok(dnssec_ok);
            edns
        });

        let mut source = peer.ip();
        if let (Some(request_edns), Some(response_edns)) = (request_edns, response_edns.as_mut()) {
            if let Some(verifier) = &self.cookies {
                let now = unix_now();
                let status = verifier.check(cookie_option(request_edns), peer.ip(), now);
                if status == CookieStatus::Malformed {
                    response.set_response_code(ResponseCode::FormErr);
                    response.set_edns(response_edns.clone());
                    return serialize(&response);
                }
                if let Some(cookie) = verifier.response_cookie(&status, peer.ip(), now) {
                    response_edns.options_mut().insert(cookie_reply(cookie));
                }
                if status.is_bad() {
                    debug!(peer = %peer, "Rejected server cookie");
                    response.set_response_code(ResponseCode::BADCOOKIE);
                    response_edns.set_rcode_high(ResponseCode::BADCOOKIE.high());
                    response.set_edns(response_edns.clone());
                    return serialize(&response);
                }
            }

            if let Some(subnet) = client_subnet(request_edns) {
                source = steering_source(Some(&subnet), peer.ip());
                response_edns.options_mut().insert(echo_subnet(&subnet));
            }
        }

        let ctx = RequestContext::new(query.name().clone(), query.query_type(), source)
            .with_dnssec_ok(dnssec_ok);
        let resolution = self.engine.resolve(&ctx).await;

        response
            .set_authoritative(resolution.authoritative)
            .set_response_code(resolution.rcode);
        response.insert_answers(resolution.answers);
        response.insert_name_servers(resolution.authority);
        response.insert_additionals(resolution.additional);
        if let Some(mut edns) = response_edns {
            edns.set_rcode_high(resolution.rcode.high());
            response.set_edns(edns);
        }

        let mut wire = serialize(&response)?;
        if protocol == Protocol::Udp {
            let limit = match request_edns {
                Some(edns) => usize::from(edns.max_payload().min(self.max_udp_payload))
                    .max(CLASSIC_UDP_PAYLOAD),
                None => CLASSIC_UDP_PAYLOAD,
            };
            if wire.len() > limit {
                debug!(name = %query.name(), size = wire.len(), limit = limit, "Truncating UDP response");
                response.take_answers();
                response.take_name_servers();
                response.take_additionals();
                response.set_truncated(true);
                wire = serialize(&response)?;
            }
        }

        self.emit(&resolution.zone, &ctx, resolution.rcode, started, protocol);
        Some(wire)
    }

    fn emit(
        &self,
        zone: &Option<String>,
        ctx: &RequestContext,
        rcode: ResponseCode,
        started: Instant,
        protocol: Protocol,
    ) {
        if !self.emitter.is_enabled() {
            return;
        }
        self.emitter.emit(QueryEvent {
            zone: zone.as_deref().map(Arc::from),
            name: Arc::from(ctx.qname.to_ascii()),
            record_type: ctx.qtype,
            rcode,
            process_time_us: started.elapsed().as_micros() as u64,
            source: ctx.source,
            country: self.geoip.country(ctx.source).ok(),
            asn: self.geoip.asn(ctx.source).ok(),
            protocol: protocol.as_str(),
        });
    }
}

fn serialize(message: &Message) -> Option<Vec<u8>> {
    match message.to_vec() {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            error!(id = message.id(), error = %e, "Failed to serialize response");
            None
        }
    }
}
