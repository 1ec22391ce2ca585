//! Conversions between replication messages and their protobuf form, shared by the gRPC
//! client and server.

use crate::database::{Frame, Position};
use crate::grpc::{
    proto_catalog_message, proto_stream_message, ProtoAckReq, ProtoCatalog, ProtoCatalogMessage, ProtoDatabaseInfo,
    ProtoEnd, ProtoErrorCode, ProtoFrame, ProtoPosition, ProtoSnapshot, ProtoStreamMessage, ProtoStreamReq,
};
use crate::replication::{
    Acknowledgement, CatalogMessage, DatabaseInfo, StreamErrorCode, StreamMessage, StreamRequest, TransportError,
};
use bytes::Bytes;

pub(crate) fn position_to_proto(position: Position) -> ProtoPosition {
    ProtoPosition {
        generation: position.generation,
        sequence: position.sequence,
    }
}

pub(crate) fn position_from_proto(proto: Option<ProtoPosition>) -> Result<Position, TransportError> {
    proto
        .map(|p| Position::new(p.generation, p.sequence))
        .ok_or_else(|| TransportError::Protocol("missing position".to_string()))
}

fn error_code_to_proto(code: StreamErrorCode) -> i32 {
    let proto = match code {
        StreamErrorCode::PositionTooOld => ProtoErrorCode::PositionTooOld,
        StreamErrorCode::UnknownDatabase => ProtoErrorCode::UnknownDatabase,
        StreamErrorCode::NotPrimary => ProtoErrorCode::NotPrimary,
        StreamErrorCode::Desync => ProtoErrorCode::Desync,
        StreamErrorCode::ResyncUnavailable => ProtoErrorCode::ResyncUnavailable,
    };
    proto as i32
}

fn error_code_from_proto(value: i32) -> Result<StreamErrorCode, TransportError> {
    match ProtoErrorCode::from_i32(value) {
        Some(ProtoErrorCode::PositionTooOld) => Ok(StreamErrorCode::PositionTooOld),
        Some(ProtoErrorCode::UnknownDatabase) => Ok(StreamErrorCode::UnknownDatabase),
        Some(ProtoErrorCode::NotPrimary) => Ok(StreamErrorCode::NotPrimary),
        Some(ProtoErrorCode::Desync) => Ok(StreamErrorCode::Desync),
        Some(ProtoErrorCode::ResyncUnavailable) => Ok(StreamErrorCode::ResyncUnavailable),
        Some(ProtoErrorCode::Unspecified) | None => {
            Err(TransportError::Protocol(format!("unknown error code {}", value)))
        }
    }
}

pub(crate) fn stream_request_to_proto(request: StreamRequest) -> ProtoStreamReq {
    ProtoStreamReq {
        database: request.database,
        resume: Some(position_to_proto(request.resume)),
        resync: request.resync,
        client_hostname: request.client_hostname,
    }
}

pub(crate) fn stream_request_from_proto(proto: ProtoStreamReq) -> Result<StreamRequest, TransportError> {
    Ok(StreamRequest {
        database: proto.database,
        resume: position_from_proto(proto.resume)?,
        resync: proto.resync,
        client_hostname: proto.client_hostname,
    })
}

pub(crate) fn acknowledgement_to_proto(ack: Acknowledgement) -> ProtoAckReq {
    ProtoAckReq {
        database: ack.database,
        client_hostname: ack.client_hostname,
        applied: Some(position_to_proto(ack.applied)),
    }
}

pub(crate) fn acknowledgement_from_proto(proto: ProtoAckReq) -> Result<Acknowledgement, TransportError> {
    Ok(Acknowledgement {
        database: proto.database,
        client_hostname: proto.client_hostname,
        applied: position_from_proto(proto.applied)?,
    })
}

pub(crate) fn stream_message_to_proto(message: StreamMessage) -> ProtoStreamMessage {
    let message = match message {
        StreamMessage::Frame(frame) => proto_stream_message::Message::Frame(ProtoFrame {
            position: Some(position_to_proto(frame.position)),
            data: frame.data.to_vec(),
        }),
        StreamMessage::Snapshot { position, image } => proto_stream_message::Message::Snapshot(ProtoSnapshot {
            position: Some(position_to_proto(position)),
            image: image.to_vec(),
        }),
        StreamMessage::End => proto_stream_message::Message::End(ProtoEnd {}),
        StreamMessage::Error(code) => proto_stream_message::Message::Error(error_code_to_proto(code)),
    };

    ProtoStreamMessage { message: Some(message) }
}

pub(crate) fn stream_message_from_proto(proto: ProtoStreamMessage) -> Result<StreamMessage, TransportError> {
    match proto.message {
        Some(proto_stream_message::Message::Frame(frame)) => Ok(StreamMessage::Frame(Frame::new(
            position_from_proto(frame.position)?,
            Bytes::from(frame.data),
        ))),
        Some(proto_stream_message::Message::Snapshot(snapshot)) => Ok(StreamMessage::Snapshot {
            position: position_from_proto(snapshot.position)?,
            image: Bytes::from(snapshot.image),
        }),
        Some(proto_stream_message::Message::End(_)) => Ok(StreamMessage::End),
        Some(proto_stream_message::Message::Error(code)) => Ok(StreamMessage::Error(error_code_from_proto(code)?)),
        None => Err(TransportError::Protocol("empty stream message".to_string())),
    }
}

pub(crate) fn catalog_message_to_proto(message: CatalogMessage) -> ProtoCatalogMessage {
    let message = match message {
        CatalogMessage::Databases(databases) => proto_catalog_message::Message::Catalog(ProtoCatalog {
            databases: databases
                .into_iter()
                .map(|info| ProtoDatabaseInfo {
                    name: info.name,
                    position: Some(position_to_proto(info.position)),
                })
                .collect(),
        }),
        CatalogMessage::Error(code) => proto_catalog_message::Message::Error(error_code_to_proto(code)),
    };

    ProtoCatalogMessage { message: Some(message) }
}

pub(crate) fn catalog_message_from_proto(proto: ProtoCatalogMessage) -> Result<CatalogMessage, TransportError> {
    match proto.message {
        Some(proto_catalog_message::Message::Catalog(catalog)) => {
            let mut databases = Vec::with_capacity(catalog.databases.len());
            for info in catalog.databases {
                databases.push(DatabaseInfo {
                    name: info.name,
                    position: position_from_proto(info.position)?,
                });
            }
            Ok(CatalogMessage::Databases(databases))
        }
        Some(proto_catalog_message::Message::Error(code)) => Ok(CatalogMessage::Error(error_code_from_proto(code)?)),
        None => Err(TransportError::Protocol("empty catalog message".to_string())),
    }
}
