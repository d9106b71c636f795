use std::sync::Arc;
use std::time::Duration;

use bacsim_core::types::{ObjectId, ObjectType, PropertyId};
use bacsim_datalink::UdpTransport;
use bacsim_server::object::FileAccessMethod;
use bacsim_server::{Device, Object, PropertyValue, Server, ServerConfig};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "bacsim-server")]
struct Args {
    /// UDP port to listen on.
    #[arg(long, default_value_t = 47808)]
    port: u16,
    /// Device instance number.
    #[arg(long, default_value_t = 1001)]
    device_id: u32,
    /// Device object name.
    #[arg(long, default_value = "bacsim device")]
    device_name: String,
    /// Physical location of the device.
    #[arg(long, default_value = "Test Location")]
    location: String,
    /// Period of the sensor-simulation task in seconds; 0 disables it.
    #[arg(long, default_value_t = 0)]
    simulate_secs: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let config = ServerConfig::new(args.port, args.device_id, args.device_name, args.location)?;
    let mut device = Device::new(
        config.device_instance,
        config.device_name.clone(),
        config.location.clone(),
    );
    add_sample_objects(&mut device);

    let transport = UdpTransport::bind(config.bind_addr()).await?;
    let server = Arc::new(Server::new(device, transport));

    println!(
        "bacsim server: device {} on port {}. Ctrl+C to stop.",
        config.device_instance, config.port
    );

    let runner = {
        let server = Arc::clone(&server);
        tokio::spawn(async move { server.run().await })
    };

    if args.simulate_secs > 0 {
        let server = Arc::clone(&server);
        let period = Duration::from_secs(args.simulate_secs);
        tokio::spawn(async move {
            simulate_sensor_drift(server, period).await;
        });
    }

    tokio::signal::ctrl_c().await?;
    server.stop();
    runner.abort();
    println!("server stopped");
    Ok(())
}

/// Periodically nudges the sensor readings so COV subscribers see traffic.
async fn simulate_sensor_drift(server: Arc<Server<UdpTransport>>, period: Duration) {
    let mut tick = 0u32;
    let mut interval = tokio::time::interval(period);
    loop {
        interval.tick().await;
        tick = tick.wrapping_add(1);

        // Triangle-wave drift around each sensor's baseline.
        let phase = (tick % 20) as f32;
        let swing = if phase < 10.0 { phase } else { 20.0 - phase };

        let updates = [
            (1u32, 18.0 + swing * 1.2), // temperature, 18-30 °C
            (2, 30.0 + swing * 5.0),    // humidity, 30-80 %
            (3, 3.0 + swing * 0.3),     // pressure, 3.0-6.0 bar
        ];
        for (instance, value) in updates {
            let object_id = ObjectId::new(ObjectType::AnalogInput, instance);
            if let Err(e) = server
                .simulate_change(object_id, PropertyId::PresentValue, PropertyValue::Real(value))
                .await
            {
                log::warn!("sensor simulation send failed: {e}");
            }
        }
    }
}

fn add_sample_objects(device: &mut Device) {
    let mut temperature = Object::standard(ObjectType::AnalogInput, 1, "Temperature Sensor");
    temperature
        .core_mut()
        .set_property(PropertyId::Description, "Room temperature sensor");
    temperature
        .core_mut()
        .set_property(PropertyId::PresentValue, PropertyValue::Real(22.5));
    device.add_object(temperature);

    let mut humidity = Object::standard(ObjectType::AnalogInput, 2, "Humidity Sensor");
    humidity
        .core_mut()
        .set_property(PropertyId::Description, "Room humidity sensor");
    humidity
        .core_mut()
        .set_property(PropertyId::PresentValue, PropertyValue::Real(45.0));
    device.add_object(humidity);

    // Alarm-capable pressure sensor wired to notification class 1.
    let mut pressure = Object::standard(ObjectType::AnalogInput, 3, "Pressure Sensor");
    pressure
        .core_mut()
        .set_property(PropertyId::Description, "Water pressure sensor");
    pressure
        .core_mut()
        .set_property(PropertyId::PresentValue, PropertyValue::Real(4.5));
    pressure
        .core_mut()
        .set_property(PropertyId::EventState, PropertyValue::Enumerated(0));
    pressure
        .core_mut()
        .set_property(PropertyId::NotificationClass, PropertyValue::Unsigned32(1));
    pressure
        .core_mut()
        .set_property(PropertyId::StatusFlags, PropertyValue::Unsigned8(0));
    device.add_object(pressure);

    let mut light = Object::standard(ObjectType::BinaryOutput, 1, "Light Switch");
    light
        .core_mut()
        .set_property(PropertyId::Description, "Main room light");
    light
        .core_mut()
        .set_property(PropertyId::PresentValue, PropertyValue::Boolean(false));
    device.add_object(light);

    let mut ac = Object::standard(ObjectType::BinaryOutput, 2, "AC Switch");
    ac.core_mut()
        .set_property(PropertyId::Description, "Air conditioner control");
    ac.core_mut()
        .set_property(PropertyId::PresentValue, PropertyValue::Boolean(true));
    device.add_object(ac);

    let mut setpoint = Object::standard(ObjectType::AnalogValue, 1, "Temperature Setpoint");
    setpoint
        .core_mut()
        .set_property(PropertyId::Description, "Desired room temperature");
    setpoint
        .core_mut()
        .set_property(PropertyId::PresentValue, PropertyValue::Real(22.0));
    device.add_object(setpoint);

    let mut notification_class =
        Object::standard(ObjectType::NotificationClass, 1, "Default Notification Class");
    notification_class
        .core_mut()
        .set_property(PropertyId::Description, "Default notification settings");
    notification_class
        .core_mut()
        .set_property(PropertyId::Priority, PropertyValue::Unsigned8(10));
    device.add_object(notification_class);

    let mut event_log = Object::standard(ObjectType::EventLog, 1, "System Event Log");
    event_log
        .core_mut()
        .set_property(PropertyId::Description, "System-wide event log");
    device.add_object(event_log);

    device.add_object(Object::file(1, "Configuration File", FileAccessMethod::Stream));

    let mut enrollment =
        Object::standard(ObjectType::EventEnrollment, 1, "Pressure Alarm Enrollment");
    enrollment
        .core_mut()
        .set_property(PropertyId::Description, "Enrollment for pressure alarm events");
    device.add_object(enrollment);
}
