//! Reading [`MessageData`].

use super::{MessageData, MessageType, UnknownMessage};
use crate::chunk::Chunk;
use crate::command_messages::Command;
use crate::protocol_control_messages::{
    ProtocolControlMessageAcknowledgement, ProtocolControlMessageSetChunkSize, ProtocolControlMessageSetPeerBandwidth,
    ProtocolControlMessageWindowAcknowledgementSize,
};
use crate::user_control_messages::EventMessage;

impl<'a> MessageData<'a> {
    /// Reads [`MessageData`] from the given chunk.
    pub fn read(chunk: &'a Chunk) -> Result<Self, crate::error::RtmpError> {
        match chunk.message_header.msg_type_id {
            // Protocol Control Messages
            MessageType::SET_CHUNK_SIZE => {
                let data = ProtocolControlMessageSetChunkSize::read(&chunk.payload)?;
                Ok(Self::SetChunkSize(data))
            }
            MessageType::ACKNOWLEDGEMENT => {
                let data = ProtocolControlMessageAcknowledgement::read(&chunk.payload)?;
                Ok(Self::Acknowledgement(data))
            }
            MessageType::WINDOW_ACKNOWLEDGEMENT_SIZE => {
                let data = ProtocolControlMessageWindowAcknowledgementSize::read(&chunk.payload)?;
                Ok(Self::SetAcknowledgementWindowSize(data))
            }
            MessageType::SET_PEER_BANDWIDTH => {
                let data = ProtocolControlMessageSetPeerBandwidth::read(&chunk.payload)?;
                Ok(Self::SetPeerBandwidth(data))
            }
            MessageType::USER_CONTROL_EVENT => {
                let data = EventMessage::read(&chunk.payload)?;
                Ok(Self::UserControl(data))
            }
            // RTMP Command Messages
            MessageType::AUDIO => Ok(Self::AudioData {
                data: chunk.payload.clone(),
            }),
            MessageType::VIDEO => Ok(Self::VideoData {
                data: chunk.payload.clone(),
            }),
            // Metadata
            MessageType::DATA_AMF0 => Ok(Self::DataAmf0 {
                data: chunk.payload.clone(),
            }),
            MessageType::COMMAND_AMF0 => Ok(Self::Amf0Command(Command::read(&chunk.payload)?)),
            msg_type_id => Ok(Self::Unknown(UnknownMessage {
                msg_type_id,
                data: chunk.payload.clone(),
            })),
        }
    }
}
