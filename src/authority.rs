//! Hickory DNS authority answering alias names with one weighted target.

use async_trait::async_trait;
use hickory_proto::op::ResponseCode;
use hickory_proto::rr::rdata::{CNAME, NS, SOA};
use hickory_proto::rr::{DNSClass, LowerName, Name, RData, Record, RecordSet, RecordType};
use hickory_server::authority::{
    Authority, LookupControlFlow, LookupError, LookupOptions, LookupRecords, MessageRequest,
    UpdateResult, ZoneType,
};
use hickory_server::server::RequestInfo;
use std::sync::Arc;
use tracing::{debug, trace, warn};

use crate::config::DnsConfig;
use crate::error::DnsError;
use crate::metrics::{self, QueryResult, Timer};
use crate::selector::CnameSelector;
use crate::state::ZoneState;
use crate::weights::normalize_name;

/// Authority for one zone, backed by its alias records and the shared
/// selector.
pub struct CnameAuthority {
    origin: LowerName,
    /// Normalized origin, for apex checks.
    origin_key: String,
    zone: ZoneState,
    selector: Arc<CnameSelector>,
    config: Arc<DnsConfig>,
}

impl CnameAuthority {
    /// Create a new authority for the given zone.
    pub fn new(
        config: Arc<DnsConfig>,
        zone: ZoneState,
        selector: Arc<CnameSelector>,
    ) -> Result<Self, DnsError> {
        let origin_key = zone.origin();
        let origin = Name::from_ascii(&origin_key)
            .map_err(|e| DnsError::InvalidName(format!("zone origin {origin_key}: {e}")))?
            .into();

        Ok(Self {
            origin,
            origin_key,
            zone,
            selector,
            config,
        })
    }

    /// Zone data served by this authority.
    pub fn zone(&self) -> &ZoneState {
        &self.zone
    }

    /// Build a single-record CNAME set.
    fn build_cname_record(
        &self,
        name: Name,
        target: &str,
    ) -> Result<RecordSet, hickory_proto::ProtoError> {
        let target = Name::from_ascii(target)?;
        let mut record_set = RecordSet::new(name.clone(), RecordType::CNAME, 0);
        let mut record = Record::from_rdata(name, self.config.ttl, RData::CNAME(CNAME(target)));
        record.set_dns_class(DNSClass::IN);
        record_set.insert(record, 0);

        Ok(record_set)
    }

    /// Build the SOA record for this zone.
    fn build_soa_record(&self) -> RecordSet {
        let soa = SOA::new(
            Name::from_ascii(&self.config.soa.mname).unwrap_or_else(|_| Name::root()),
            Name::from_ascii(&self.config.soa.rname).unwrap_or_else(|_| Name::root()),
            self.zone.serial(),
            self.config.soa.refresh as i32,
            self.config.soa.retry as i32,
            self.config.soa.expire as i32,
            self.config.soa.minimum,
        );

        let name = Name::from(self.origin.clone());
        let mut record_set = RecordSet::new(name.clone(), RecordType::SOA, 0);
        let mut record = Record::from_rdata(name, self.config.ttl, RData::SOA(soa));
        record.set_dns_class(DNSClass::IN);
        record_set.insert(record, 0);

        record_set
    }

    /// Build an NS record for this zone.
    fn build_ns_record(&self) -> RecordSet {
        let name = Name::from(self.origin.clone());
        let ns_name = Name::from_ascii(&self.config.soa.mname).unwrap_or_else(|_| Name::root());

        let mut record_set = RecordSet::new(name.clone(), RecordType::NS, 0);
        let mut record = Record::from_rdata(name, self.config.ttl, RData::NS(NS(ns_name)));
        record.set_dns_class(DNSClass::IN);
        record_set.insert(record, 0);

        record_set
    }

    /// Answer an alias name with the selected target.
    fn lookup_alias(
        &self,
        name: &LowerName,
        rtype_str: &str,
        lookup_options: LookupOptions,
        timer: &Timer,
    ) -> Option<LookupControlFlow<LookupRecords>> {
        let records = self.zone.lookup_aliases(&name.to_string());
        let selection = self.selector.select(&self.origin_key, &records)?;

        match self.build_cname_record(Name::from(name.clone()), &selection.target) {
            Ok(record_set) => {
                debug!(
                    name = %name,
                    target = %selection.target,
                    method = selection.method.as_str(),
                    candidates = records.len(),
                    "alias lookup"
                );
                metrics::record_query(rtype_str, QueryResult::Success, timer.elapsed());
                Some(LookupControlFlow::Break(Ok(LookupRecords::new(
                    lookup_options,
                    Arc::new(record_set),
                ))))
            }
            Err(e) => {
                warn!(name = %name, target = %selection.target, error = %e, "invalid alias target");
                metrics::record_query(rtype_str, QueryResult::Error, timer.elapsed());
                Some(LookupControlFlow::Break(Err(LookupError::ResponseCode(
                    ResponseCode::ServFail,
                ))))
            }
        }
    }
}

#[async_trait]
impl Authority for CnameAuthority {
    type Lookup = LookupRecords;

    fn zone_type(&self) -> ZoneType {
        ZoneType::Primary
    }

    fn is_axfr_allowed(&self) -> bool {
        false
    }

    fn origin(&self) -> &LowerName {
        &self.origin
    }

    async fn lookup(
        &self,
        name: &LowerName,
        rtype: RecordType,
        lookup_options: LookupOptions,
    ) -> LookupControlFlow<Self::Lookup> {
        let timer = Timer::start();
        let rtype_str = format!("{:?}", rtype);
        let is_apex = normalize_name(&name.to_string()) == self.origin_key;

        trace!(name = %name, rtype = ?rtype, "DNS lookup");

        match rtype {
            RecordType::SOA if is_apex => {
                debug!(name = %name, "SOA lookup");
                metrics::record_query(&rtype_str, QueryResult::Success, timer.elapsed());
                let record_set = Arc::new(self.build_soa_record());
                return LookupControlFlow::Break(Ok(LookupRecords::new(lookup_options, record_set)));
            }
            RecordType::NS if is_apex => {
                debug!(name = %name, "NS lookup");
                metrics::record_query(&rtype_str, QueryResult::Success, timer.elapsed());
                let record_set = Arc::new(self.build_ns_record());
                return LookupControlFlow::Break(Ok(LookupRecords::new(lookup_options, record_set)));
            }
            _ => {}
        }

        // An alias name answers every other type with its CNAME
        if let Some(result) = self.lookup_alias(name, &rtype_str, lookup_options, &timer) {
            return result;
        }

        if is_apex {
            trace!(name = %name, rtype = ?rtype, "apex has no records of this type");
            metrics::record_query(&rtype_str, QueryResult::NoData, timer.elapsed());
            LookupControlFlow::Break(Err(LookupError::ResponseCode(ResponseCode::NoError)))
        } else {
            debug!(name = %name, "no alias records found");
            metrics::record_query(&rtype_str, QueryResult::NxDomain, timer.elapsed());
            LookupControlFlow::Break(Err(LookupError::ResponseCode(ResponseCode::NXDomain)))
        }
    }

    async fn search(
        &self,
        request_info: RequestInfo<'_>,
        lookup_options: LookupOptions,
    ) -> LookupControlFlow<Self::Lookup> {
        self.lookup(
            request_info.query.name(),
            request_info.query.query_type(),
            lookup_options,
        )
        .await
    }

    async fn get_nsec_records(
        &self,
        _name: &LowerName,
        _lookup_options: LookupOptions,
    ) -> LookupControlFlow<Self::Lookup> {
        // DNSSEC not supported
        LookupControlFlow::Break(Err(LookupError::ResponseCode(ResponseCode::NoError)))
    }

    async fn update(&self, _update: &MessageRequest) -> UpdateResult<bool> {
        // Dynamic updates not supported
        Err(ResponseCode::NotImp)
    }
}
